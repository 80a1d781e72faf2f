//! # Ports
//!
//! Any adapter must implement these traits to be wired into the services.

use async_trait::async_trait;
use bytes::Bytes;
use mime::Mime;
use secrecy::SecretString;
use tokio::sync::watch;

use crate::errors::{AuthError, StoreError};
use crate::models::{BlobPath, DeletionReport, ListingId, Session};
use crate::search::SearchRange;

/// A document as it sits in the record store, before schema validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub id: ListingId,
    pub data: serde_json::Value,
}

/// The queries the listing views need from the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingQuery {
    /// Every document, `createdAt` descending. Documents without a valid
    /// `createdAt` are not part of the ordering and are left out.
    Newest,
    /// Equality filter on `ownerUid`; store default order.
    OwnedBy(String),
    /// `name` in `[lower, upper)`, ordered by `name`.
    NameRange(SearchRange),
}

/// Document persistence for the `cars` collection.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Persists a new document and returns the id the store assigned.
    async fn insert(&self, document: serde_json::Value) -> Result<ListingId, StoreError>;

    async fn get(&self, id: &ListingId) -> Result<Option<RawDocument>, StoreError>;

    /// One snapshot read.
    async fn query(&self, query: &ListingQuery) -> Result<Vec<RawDocument>, StoreError>;

    /// Reports [`StoreError::NotFound`] when no document has this id.
    async fn delete(&self, id: &ListingId) -> Result<(), StoreError>;
}

/// Object storage for image bytes.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes raw bytes with their declared MIME type.
    async fn put(&self, path: &BlobPath, data: Bytes, content_type: &Mime) -> Result<(), StoreError>;

    /// Durable fetch URL for an existing object.
    async fn download_url(&self, path: &BlobPath) -> Result<String, StoreError>;

    /// Reports [`StoreError::NotFound`] when the object is absent.
    async fn delete(&self, path: &BlobPath) -> Result<(), StoreError>;
}

/// Identity provider contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Session, AuthError>;

    /// Creates the account and signs it in.
    async fn sign_up(&self, email: &str, password: &SecretString) -> Result<Session, AuthError>;

    /// Sets the display name of the signed-in user.
    async fn update_profile(&self, display_name: &str) -> Result<Session, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Current session or its absence; updated on every provider transition.
    /// Dropping the receiver ends the subscription.
    fn subscribe(&self) -> watch::Receiver<Option<Session>>;
}

/// Observability sink for best-effort media cleanup.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait CleanupObserver: Send + Sync {
    fn report(&self, report: &DeletionReport);
}
