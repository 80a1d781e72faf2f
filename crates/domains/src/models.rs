//! # Domain Models
//!
//! These structs represent the core entities of the vehicle classifieds.
//! Listings are stored as JSON documents; the field names on the wire are
//! camelCase to match the `cars` collection schema.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier assigned by the record store on creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(String);

impl ListingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ListingId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ListingId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identifier of an image asset, unique within its owner's namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(Uuid);

impl AssetId {
    /// Generates a fresh random id (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for AssetId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Object path inside the blob store: `images/{ownerUid}/{assetId}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobPath(String);

impl BlobPath {
    pub const ROOT: &'static str = "images";

    pub fn for_asset(owner_uid: &str, asset_id: &AssetId) -> Self {
        Self(format!("{}/{}/{}", Self::ROOT, owner_uid, asset_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments, in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A reference to one stored image asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    /// Owner scoping the storage path.
    pub owner_uid: String,
    pub asset_id: AssetId,
    /// Durable retrieval URL issued by the blob store after upload.
    pub url: String,
}

impl ImageRef {
    pub fn storage_path(&self) -> BlobPath {
        BlobPath::for_asset(&self.owner_uid, &self.asset_id)
    }
}

/// A raw file picked by the user, with the media type the browser declared.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl MediaFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// The authenticated identity of the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: String,
}

/// The listing form as submitted, before validation.
///
/// `year`, `km` and `price` are kept as text: they are stored as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingFields {
    pub name: String,
    pub model: String,
    pub year: String,
    pub km: String,
    pub price: String,
    pub city: String,
    pub whatsapp: String,
    pub description: String,
}

/// A published vehicle advertisement.
///
/// `id` is not part of the stored document body; it is the document key and
/// is filled in by [`Listing::from_document`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(skip)]
    pub id: ListingId,
    pub owner_uid: String,
    #[serde(default)]
    pub owner_name: Option<String>,
    /// Upper-cased at creation for prefix search.
    pub name: String,
    pub model: String,
    pub year: String,
    pub km: String,
    pub price: String,
    pub city: String,
    pub whatsapp: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub images: Vec<ImageRef>,
}

/// Why a stored document could not be decoded into a [`Listing`].
#[derive(Debug, thiserror::Error)]
pub enum MalformedDocument {
    #[error("schema mismatch: {0}")]
    Schema(#[from] serde_json::Error),
    #[error("listing has no images")]
    NoImages,
}

impl Listing {
    /// Decodes a stored document body under the strict listing schema.
    pub fn from_document(
        id: ListingId,
        data: serde_json::Value,
    ) -> std::result::Result<Self, MalformedDocument> {
        let mut listing: Listing = serde_json::from_value(data)?;
        if listing.images.is_empty() {
            return Err(MalformedDocument::NoImages);
        }
        listing.id = id;
        Ok(listing)
    }

    /// The document body as persisted (without the id).
    pub fn to_document(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// Image shown on listing cards.
    pub fn cover(&self) -> Option<&ImageRef> {
        self.images.first()
    }
}

/// Outcome of one image deletion attempted after its listing was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    Removed,
    /// The blob was already absent.
    AlreadyGone,
    /// The blob is now orphaned.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCleanup {
    pub path: BlobPath,
    pub outcome: CleanupOutcome,
}

/// Per-image results of deleting one listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionReport {
    pub listing_id: ListingId,
    pub images: Vec<ImageCleanup>,
}

impl DeletionReport {
    /// Blobs left behind because their deletion failed.
    pub fn orphaned(&self) -> impl Iterator<Item = &ImageCleanup> {
        self.images
            .iter()
            .filter(|c| matches!(c.outcome, CleanupOutcome::Failed(_)))
    }

    pub fn is_clean(&self) -> bool {
        self.orphaned().next().is_none()
    }
}
