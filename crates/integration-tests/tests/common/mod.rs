//! Fixtures shared by the integration test binaries.
#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use domains::{
    AssetId, BlobStore, CleanupObserver, ImageRef, Listing, ListingFields, ListingId,
    ListingStore, MediaFile, Session,
};
use services::{
    DeletionCoordinator, ListingRepository, MediaUploadPipeline, SessionGate,
    TracingCleanupObserver,
};
use storage_adapters::{MemoryBlobStore, MemoryListingStore};

pub fn seller() -> Session {
    Session {
        uid: "seller-1".into(),
        display_name: Some("Marcos".into()),
        email: "marcos@example.com".into(),
    }
}

pub fn buyer() -> Session {
    Session {
        uid: "buyer-1".into(),
        display_name: None,
        email: "bia@example.com".into(),
    }
}

pub fn signed_in(session: Session) -> Arc<SessionGate> {
    let gate = Arc::new(SessionGate::new());
    gate.apply(Some(session));
    gate
}

pub fn onix_fields() -> ListingFields {
    ListingFields {
        name: "onix".into(),
        model: "1.0 Flex Manual".into(),
        year: "2016/2016".into(),
        km: "23.900".into(),
        price: "69.000".into(),
        city: "Coroatá".into(),
        whatsapp: "11991019231".into(),
        description: "Único dono, revisões em dia".into(),
    }
}

pub fn jpeg(name: &str) -> MediaFile {
    MediaFile::new(name, "image/jpeg", Bytes::from_static(b"\xff\xd8\xff\xe0"))
}

pub fn image_of(owner_uid: &str) -> ImageRef {
    let asset_id = AssetId::generate();
    ImageRef {
        owner_uid: owner_uid.into(),
        url: format!("memory://blobs/images/{owner_uid}/{asset_id}"),
        asset_id,
    }
}

/// A schema-valid listing, stored nowhere yet.
pub fn listing(id: &str, name: &str, owner_uid: &str, created_at: &str) -> Listing {
    let created_at: DateTime<Utc> = created_at.parse().unwrap();
    Listing {
        id: ListingId::new(id),
        owner_uid: owner_uid.into(),
        owner_name: None,
        name: name.into(),
        model: "1.0".into(),
        year: "2020".into(),
        km: "10.000".into(),
        price: "50.000".into(),
        city: "São Luís".into(),
        whatsapp: "98991234567".into(),
        description: "ok".into(),
        created_at,
        images: vec![image_of(owner_uid)],
    }
}

pub fn seed(store: &MemoryListingStore, listing: &Listing) {
    store.put_document(listing.id.clone(), listing.to_document().unwrap());
}

/// Every service wired against the given ports.
pub struct Harness {
    pub gate: Arc<SessionGate>,
    pub listings: Arc<ListingRepository>,
    pub media: Arc<MediaUploadPipeline>,
    pub deletion: DeletionCoordinator,
}

impl Harness {
    pub fn with(
        gate: Arc<SessionGate>,
        records: Arc<dyn ListingStore>,
        blobs: Arc<dyn BlobStore>,
        observer: Arc<dyn CleanupObserver>,
    ) -> Self {
        let listings = Arc::new(ListingRepository::new(records, gate.clone()));
        let media = Arc::new(MediaUploadPipeline::new(blobs, gate.clone()));
        let deletion =
            DeletionCoordinator::new(listings.clone(), media.clone(), gate.clone(), observer);
        Self {
            gate,
            listings,
            media,
            deletion,
        }
    }
}

/// In-memory stores, signed in as [`seller`].
pub struct MemoryHarness {
    pub records: Arc<MemoryListingStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub services: Harness,
}

impl MemoryHarness {
    pub fn new() -> Self {
        Self::signed_in_as(seller())
    }

    pub fn signed_in_as(session: Session) -> Self {
        let records = Arc::new(MemoryListingStore::new());
        let blobs = Arc::new(MemoryBlobStore::default());
        let services = Harness::with(
            signed_in(session),
            records.clone(),
            blobs.clone(),
            Arc::new(TracingCleanupObserver),
        );
        Self {
            records,
            blobs,
            services,
        }
    }
}
