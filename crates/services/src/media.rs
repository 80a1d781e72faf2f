//! # MediaUploadPipeline
//!
//! Turns a picked file into a stored, referenceable [`ImageRef`], and removes
//! stored images again.
//!
//! Uploads are independent of each other. When several are in flight, the
//! staging area receives them in completion order, not in the order the
//! files were picked.

use std::sync::Arc;

use domains::{
    AssetId, BlobPath, BlobStore, DomainError, ImageRef, MediaFile, Result, StoreError,
};
use futures::stream::{FuturesUnordered, StreamExt};
use mime::Mime;
use tracing::{debug, info, instrument, warn};

use crate::session::SessionGate;

/// Declared media types accepted for listing photos.
pub const ACCEPTED_MEDIA_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// Parses a declared content type and checks it against the accepted set.
/// Parameters such as `; charset=...` are ignored.
pub fn accepted_media_type(declared: &str) -> Result<Mime> {
    let parsed: Mime = declared
        .trim()
        .parse()
        .map_err(|_| DomainError::InvalidMediaType(declared.to_string()))?;
    if ACCEPTED_MEDIA_TYPES.contains(&parsed.essence_str()) {
        Ok(parsed)
    } else {
        Err(DomainError::InvalidMediaType(declared.to_string()))
    }
}

pub struct MediaUploadPipeline {
    blobs: Arc<dyn BlobStore>,
    gate: Arc<SessionGate>,
}

impl MediaUploadPipeline {
    pub fn new(blobs: Arc<dyn BlobStore>, gate: Arc<SessionGate>) -> Self {
        Self { blobs, gate }
    }

    /// Stores one image under `images/{uid}/{assetId}` and resolves its URL.
    #[instrument(skip_all, fields(file = %file.file_name))]
    pub async fn submit(&self, file: MediaFile) -> Result<ImageRef> {
        let content_type = accepted_media_type(&file.content_type)?;
        let session = self.gate.require()?;

        let asset_id = AssetId::generate();
        let path = BlobPath::for_asset(&session.uid, &asset_id);
        let size = file.bytes.len();

        self.blobs.put(&path, file.bytes, &content_type).await?;
        let url = self.blobs.download_url(&path).await?;

        info!(%path, size, "image uploaded");
        Ok(ImageRef {
            owner_uid: session.uid,
            asset_id,
            url,
        })
    }

    /// Runs every upload concurrently and stages each result as it settles.
    /// Returns the failures; successful uploads are already in `staging`.
    pub async fn submit_all(
        &self,
        files: Vec<MediaFile>,
        staging: &mut StagingArea,
    ) -> Vec<DomainError> {
        let mut pending: FuturesUnordered<_> =
            files.into_iter().map(|file| self.submit(file)).collect();
        let mut failures = Vec::new();
        while let Some(result) = pending.next().await {
            match result {
                Ok(image) => staging.push(image),
                Err(err) => failures.push(err),
            }
        }
        failures
    }

    /// Deletes the blob behind `image`.
    ///
    /// An absent blob is reported as [`DomainError::MediaNotFound`].
    pub async fn remove(&self, image: &ImageRef) -> Result<()> {
        let path = image.storage_path();
        match self.blobs.delete(&path).await {
            Ok(()) => {
                debug!(%path, "image removed");
                Ok(())
            }
            Err(StoreError::NotFound(_)) => Err(DomainError::MediaNotFound(path.to_string())),
            Err(err) => Err(err.into()),
        }
    }
}

/// Images uploaded for a listing that has not been submitted yet.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StagingArea {
    images: Vec<ImageRef>,
}

impl StagingArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, image: ImageRef) {
        self.images.push(image);
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Empties the staging area, e.g. once the listing was created.
    pub fn take(&mut self) -> Vec<ImageRef> {
        std::mem::take(&mut self.images)
    }

    /// Removes a staged image from the blob store, then from the staging
    /// area. The image stays staged if removal fails for any reason other
    /// than the blob already being gone.
    pub async fn discard(&mut self, pipeline: &MediaUploadPipeline, asset_id: &AssetId) -> Result<()> {
        let Some(index) = self.images.iter().position(|img| img.asset_id == *asset_id) else {
            return Ok(());
        };
        match pipeline.remove(&self.images[index]).await {
            Ok(()) => {}
            Err(DomainError::MediaNotFound(path)) => {
                warn!(%path, "staged image was already gone");
            }
            Err(err) => return Err(err),
        }
        self.images.remove(index);
        Ok(())
    }
}
