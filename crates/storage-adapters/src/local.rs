//! # Local media store
//!
//! Filesystem implementation of `BlobStore`. Objects live at
//! `{root}/{path}`, i.e. `{root}/images/{ownerUid}/{assetId}`, and are served
//! by whatever static file server fronts `public_url`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use domains::{BlobPath, BlobStore, StoreError};
use mime::Mime;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

pub struct LocalBlobStore {
    /// Root directory for all uploads (e.g., "./data/uploads")
    root_path: PathBuf,
    /// Public URL prefix (e.g., "/static/uploads")
    url_prefix: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root_path: root.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// Maps an object path onto the filesystem, refusing anything that could
    /// escape the root.
    fn resolve(&self, path: &BlobPath) -> Result<PathBuf, StoreError> {
        let mut target = self.root_path.clone();
        for segment in path.segments() {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
                return Err(StoreError::InvalidPath(path.to_string()));
            }
            target.push(segment);
        }
        Ok(target)
    }
}

fn io_error(path: &BlobPath, err: std::io::Error) -> StoreError {
    match err.kind() {
        ErrorKind::NotFound => StoreError::NotFound(path.to_string()),
        _ => StoreError::Unavailable(format!("{path}: {err}")),
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    /// Writes to a temporary sibling first, then renames into place, so a
    /// reader never sees a half-written image.
    async fn put(&self, path: &BlobPath, data: Bytes, content_type: &Mime) -> Result<(), StoreError> {
        let target = self.resolve(path)?;
        let parent = target
            .parent()
            .ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;
        fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error(path, e))?;

        let temp = parent.join(format!(".{}.tmp", Uuid::new_v4().simple()));
        if let Err(e) = fs::write(&temp, &data).await {
            let _ = fs::remove_file(&temp).await;
            return Err(io_error(path, e));
        }
        if let Err(e) = fs::rename(&temp, &target).await {
            let _ = fs::remove_file(&temp).await;
            return Err(io_error(path, e));
        }

        debug!(%path, %content_type, size = data.len(), "blob written");
        Ok(())
    }

    async fn download_url(&self, path: &BlobPath) -> Result<String, StoreError> {
        let target = self.resolve(path)?;
        let exists = fs::try_exists(&target)
            .await
            .map_err(|e| io_error(path, e))?;
        if !exists {
            return Err(StoreError::NotFound(path.to_string()));
        }
        Ok(format!("{}/{}", self.url_prefix, path))
    }

    async fn delete(&self, path: &BlobPath) -> Result<(), StoreError> {
        let target = self.resolve(path)?;
        fs::remove_file(&target)
            .await
            .map_err(|e| io_error(path, e))
    }
}
