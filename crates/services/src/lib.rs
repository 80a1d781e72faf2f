//! crates/services/src/lib.rs
//!
//! Listing lifecycle and media consistency services. Every service receives
//! its ports and the shared [`SessionGate`] explicitly.

pub mod accounts;
pub mod deletion;
pub mod listings;
pub mod media;
pub mod session;

pub use accounts::AccountService;
pub use deletion::{DeletionCoordinator, TracingCleanupObserver};
pub use listings::{ListingFilter, ListingRepository};
pub use media::{accepted_media_type, MediaUploadPipeline, StagingArea, ACCEPTED_MEDIA_TYPES};
pub use session::{AuthState, SessionGate};
