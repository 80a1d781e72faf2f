//! # DeletionCoordinator
//!
//! Removes a listing document, then makes one best-effort attempt per image
//! blob. The two stores fail independently and there is no transaction
//! between them: once the document is gone it stays gone, and a blob whose
//! deletion fails is left orphaned and reported.

use std::sync::Arc;

use domains::{
    CleanupObserver, CleanupOutcome, DeletionReport, DomainError, ImageCleanup, Listing,
    ListingId, Result,
};
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::listings::ListingRepository;
use crate::media::MediaUploadPipeline;
use crate::session::SessionGate;

/// Logs every cleanup outcome; orphaned blobs at `warn` with their path.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCleanupObserver;

impl CleanupObserver for TracingCleanupObserver {
    fn report(&self, report: &DeletionReport) {
        for cleanup in &report.images {
            match &cleanup.outcome {
                CleanupOutcome::Removed => {
                    debug!(listing_id = %report.listing_id, path = %cleanup.path, "image blob removed");
                }
                CleanupOutcome::AlreadyGone => {
                    info!(listing_id = %report.listing_id, path = %cleanup.path, "image blob was already absent");
                }
                CleanupOutcome::Failed(reason) => {
                    warn!(listing_id = %report.listing_id, path = %cleanup.path, %reason, "image blob orphaned");
                }
            }
        }
    }
}

pub struct DeletionCoordinator {
    listings: Arc<ListingRepository>,
    media: Arc<MediaUploadPipeline>,
    gate: Arc<SessionGate>,
    observer: Arc<dyn CleanupObserver>,
}

impl DeletionCoordinator {
    pub fn new(
        listings: Arc<ListingRepository>,
        media: Arc<MediaUploadPipeline>,
        gate: Arc<SessionGate>,
        observer: Arc<dyn CleanupObserver>,
    ) -> Self {
        Self {
            listings,
            media,
            gate,
            observer,
        }
    }

    /// Deletes the document, then every image blob independently.
    ///
    /// Ownership and the images to clean up come from the stored record, not
    /// from `listing`. When no readable record exists the document counts as
    /// already deleted; only images in the caller's own namespace are then
    /// attempted.
    ///
    /// Succeeds as soon as the document is deleted; image failures only show
    /// up in the returned report and in the observer.
    pub async fn delete(&self, listing: &Listing) -> Result<DeletionReport> {
        let session = self.gate.require()?;

        let images = match self.listings.get(&listing.id).await? {
            Some(stored) => {
                if stored.owner_uid != session.uid {
                    return Err(DomainError::unauthorized(format!(
                        "listing {} belongs to another user",
                        listing.id
                    )));
                }
                self.listings.delete(&listing.id).await?;
                stored.images
            }
            None => {
                if listing.owner_uid != session.uid {
                    return Err(DomainError::unauthorized(format!(
                        "listing {} belongs to another user",
                        listing.id
                    )));
                }
                debug!(listing_id = %listing.id, "no stored record, cleaning images only");
                listing
                    .images
                    .iter()
                    .filter(|image| image.owner_uid == session.uid)
                    .cloned()
                    .collect()
            }
        };

        let attempts = images.iter().map(|image| async move {
            let path = image.storage_path();
            let outcome = match self.media.remove(image).await {
                Ok(()) => CleanupOutcome::Removed,
                Err(DomainError::MediaNotFound(_)) => CleanupOutcome::AlreadyGone,
                Err(err) => CleanupOutcome::Failed(err.to_string()),
            };
            ImageCleanup { path, outcome }
        });
        let report = DeletionReport {
            listing_id: listing.id.clone(),
            images: join_all(attempts).await,
        };

        self.observer.report(&report);
        info!(
            listing_id = %listing.id,
            images = report.images.len(),
            orphaned = report.orphaned().count(),
            "listing deleted"
        );
        Ok(report)
    }

    /// Deletes the listing with `id` from a view's collection.
    ///
    /// The collection is updated once, after every image attempt has
    /// settled. An unknown id leaves the collection untouched and deletes
    /// nothing.
    pub async fn delete_from(
        &self,
        collection: &mut Vec<Listing>,
        id: &ListingId,
    ) -> Result<Option<DeletionReport>> {
        let Some(listing) = collection.iter().find(|l| l.id == *id).cloned() else {
            return Ok(None);
        };
        let report = self.delete(&listing).await?;
        collection.retain(|l| l.id != *id);
        Ok(Some(report))
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Mutex;

    use super::*;
    use domains::{AssetId, BlobPath};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn cleanup(outcome: CleanupOutcome) -> ImageCleanup {
        ImageCleanup {
            path: BlobPath::for_asset("u1", &AssetId::generate()),
            outcome,
        }
    }

    #[test]
    fn tracing_observer_logs_each_outcome_with_its_path() {
        let report = DeletionReport {
            listing_id: ListingId::new("car-1"),
            images: vec![
                cleanup(CleanupOutcome::Removed),
                cleanup(CleanupOutcome::AlreadyGone),
                cleanup(CleanupOutcome::Failed("quota".into())),
            ],
        };
        let paths: Vec<String> = report.images.iter().map(|c| c.path.to_string()).collect();
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            TracingCleanupObserver.report(&report);
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let line = |needle: &str| {
            output
                .lines()
                .find(|l| l.contains(needle))
                .unwrap_or_else(|| panic!("no line with {needle:?} in:\n{output}"))
                .to_string()
        };
        assert!(line(&paths[0]).contains("DEBUG"));
        assert!(line(&paths[1]).contains("INFO"));
        let orphan = line(&paths[2]);
        assert!(orphan.contains("WARN"));
        assert!(orphan.contains("image blob orphaned"));
        assert!(orphan.contains("quota"));
    }
}
