//! # ListingRepository
//!
//! Creates, lists, searches and deletes listing documents.
//!
//! Every document read from the store goes through [`Listing::from_document`];
//! documents that do not match the schema are quarantined (logged and left
//! out) instead of reaching a view with missing fields.

use std::sync::Arc;

use chrono::Utc;
use domains::validation::validate_images;
use domains::{
    range_for, DomainError, ImageRef, Listing, ListingFields, ListingId, ListingQuery,
    ListingStore, RawDocument, Result, SearchRange, StoreError,
};
use tracing::{debug, info, instrument, warn};

use crate::session::SessionGate;

/// Which listings a view wants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingFilter {
    /// Home view: everything, newest first.
    All,
    /// Dashboard view: one owner's listings, store order.
    OwnedBy(String),
    /// Prefix search over upper-cased names.
    NameRange(SearchRange),
}

impl From<ListingFilter> for ListingQuery {
    fn from(filter: ListingFilter) -> Self {
        match filter {
            ListingFilter::All => ListingQuery::Newest,
            ListingFilter::OwnedBy(uid) => ListingQuery::OwnedBy(uid),
            ListingFilter::NameRange(range) => ListingQuery::NameRange(range),
        }
    }
}

pub struct ListingRepository {
    store: Arc<dyn ListingStore>,
    gate: Arc<SessionGate>,
}

impl ListingRepository {
    pub fn new(store: Arc<dyn ListingStore>, gate: Arc<SessionGate>) -> Self {
        Self { store, gate }
    }

    /// Validates the form and the staged images, then writes one document.
    ///
    /// Nothing reaches the store unless the caller is signed in and every
    /// field and image passes validation.
    #[instrument(skip_all)]
    pub async fn create(&self, fields: ListingFields, images: Vec<ImageRef>) -> Result<ListingId> {
        let session = self.gate.require()?;

        let mut errors = match fields.validate() {
            Ok(()) => Default::default(),
            Err(errors) => errors,
        };
        if let Err(image_errors) = validate_images(&images, &session.uid) {
            errors.extend(image_errors);
        }
        errors.into_result()?;

        let listing = Listing {
            id: ListingId::default(),
            owner_uid: session.uid.clone(),
            owner_name: session.display_name.clone(),
            name: fields.name.to_uppercase(),
            model: fields.model,
            year: fields.year,
            km: fields.km,
            price: fields.price,
            city: fields.city,
            whatsapp: fields.whatsapp,
            description: fields.description,
            created_at: Utc::now(),
            images,
        };
        let document = listing
            .to_document()
            .map_err(|e| DomainError::Network(format!("failed to encode listing: {e}")))?;

        let id = self.store.insert(document).await?;
        info!(listing_id = %id, owner = %session.uid, images = listing.images.len(), "listing created");
        Ok(id)
    }

    /// One-shot snapshot of the listings matching `filter`.
    ///
    /// `OwnedBy` is the dashboard view: it needs a session, and only the
    /// session user's own uid may be asked for.
    pub async fn list(&self, filter: ListingFilter) -> Result<Vec<Listing>> {
        if let ListingFilter::OwnedBy(uid) = &filter {
            let session = self.gate.require()?;
            if *uid != session.uid {
                return Err(DomainError::unauthorized(
                    "dashboard of another user requested",
                ));
            }
        }
        let query = ListingQuery::from(filter);
        let documents = self.store.query(&query).await?;
        Ok(decode_all(documents))
    }

    /// The signed-in user's own listings.
    pub async fn dashboard(&self) -> Result<Vec<Listing>> {
        let session = self.gate.require()?;
        self.list(ListingFilter::OwnedBy(session.uid)).await
    }

    /// Prefix search; an empty prefix is the default newest-first listing.
    pub async fn search(&self, prefix: &str) -> Result<Vec<Listing>> {
        match range_for(prefix) {
            Some(range) => {
                debug!(%range, "searching listings by name");
                self.list(ListingFilter::NameRange(range)).await
            }
            None => self.list(ListingFilter::All).await,
        }
    }

    /// Detail view. Absent and malformed documents both yield `None`.
    pub async fn get(&self, id: &ListingId) -> Result<Option<Listing>> {
        let Some(document) = self.store.get(id).await? else {
            return Ok(None);
        };
        Ok(decode(document))
    }

    /// Removes the document. Deleting an id that is already gone succeeds.
    pub async fn delete(&self, id: &ListingId) -> Result<()> {
        match self.store.delete(id).await {
            Ok(()) => {
                info!(listing_id = %id, "listing document deleted");
                Ok(())
            }
            Err(StoreError::NotFound(_)) => {
                debug!(listing_id = %id, "listing already absent");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn decode(document: RawDocument) -> Option<Listing> {
    let RawDocument { id, data } = document;
    match Listing::from_document(id.clone(), data) {
        Ok(listing) => Some(listing),
        Err(error) => {
            warn!(listing_id = %id, %error, "quarantined malformed listing document");
            None
        }
    }
}

fn decode_all(documents: Vec<RawDocument>) -> Vec<Listing> {
    documents.into_iter().filter_map(decode).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{AssetId, MockListingStore, Session};
    use mockall::predicate::eq;
    use serde_json::json;

    fn signed_in_gate() -> Arc<SessionGate> {
        let gate = Arc::new(SessionGate::new());
        gate.apply(Some(Session {
            uid: "u1".into(),
            display_name: Some("Ana".into()),
            email: "ana@example.com".into(),
        }));
        gate
    }

    fn image() -> ImageRef {
        ImageRef {
            owner_uid: "u1".into(),
            asset_id: AssetId::generate(),
            url: "https://cdn/images/u1/a".into(),
        }
    }

    fn fields() -> ListingFields {
        ListingFields {
            name: "onix".into(),
            model: "1.0".into(),
            year: "2016".into(),
            km: "23.900".into(),
            price: "69.000".into(),
            city: "Coroatá".into(),
            whatsapp: "11991019231".into(),
            description: "ok".into(),
        }
    }

    #[tokio::test]
    async fn create_upper_cases_name_and_records_owner() {
        let mut store = MockListingStore::new();
        store
            .expect_insert()
            .withf(|doc: &serde_json::Value| {
                doc["name"] == json!("ONIX")
                    && doc["ownerUid"] == json!("u1")
                    && doc["ownerName"] == json!("Ana")
                    && doc["images"].as_array().map(Vec::len) == Some(1)
                    && doc.get("createdAt").is_some()
            })
            .times(1)
            .returning(|_| Ok(ListingId::new("doc-1")));

        let repo = ListingRepository::new(Arc::new(store), signed_in_gate());
        let id = repo.create(fields(), vec![image()]).await.unwrap();
        assert_eq!(id.as_str(), "doc-1");
    }

    #[tokio::test]
    async fn create_reports_fields_and_images_together() {
        let mut store = MockListingStore::new();
        store.expect_insert().never();
        let repo = ListingRepository::new(Arc::new(store), signed_in_gate());

        let form = ListingFields {
            price: String::new(),
            ..fields()
        };
        let err = repo.create(form, vec![]).await.unwrap_err();
        let fields: Vec<_> = err.validation().unwrap().fields().collect();
        assert_eq!(fields, ["price", "images"]);
    }

    #[tokio::test]
    async fn create_requires_session() {
        let mut store = MockListingStore::new();
        store.expect_insert().never();
        let repo = ListingRepository::new(Arc::new(store), Arc::new(SessionGate::new()));

        let err = repo.create(fields(), vec![image()]).await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn delete_of_absent_document_succeeds() {
        let mut store = MockListingStore::new();
        store
            .expect_delete()
            .returning(|id| Err(StoreError::NotFound(id.to_string())));
        let repo = ListingRepository::new(Arc::new(store), signed_in_gate());
        repo.delete(&ListingId::new("gone")).await.unwrap();
    }

    #[tokio::test]
    async fn delete_transport_failure_is_network_error() {
        let mut store = MockListingStore::new();
        store
            .expect_delete()
            .returning(|_| Err(StoreError::Unavailable("timeout".into())));
        let repo = ListingRepository::new(Arc::new(store), signed_in_gate());
        let err = repo.delete(&ListingId::new("x")).await.unwrap_err();
        assert!(matches!(err, DomainError::Network(_)));
    }

    #[tokio::test]
    async fn empty_search_uses_newest_query() {
        let mut store = MockListingStore::new();
        store
            .expect_query()
            .withf(|q: &ListingQuery| *q == ListingQuery::Newest)
            .times(1)
            .returning(|_| Ok(vec![]));
        let repo = ListingRepository::new(Arc::new(store), signed_in_gate());
        assert!(repo.search("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn dashboard_queries_by_session_owner() {
        let mut store = MockListingStore::new();
        store
            .expect_query()
            .with(eq(ListingQuery::OwnedBy("u1".into())))
            .times(1)
            .returning(|_| Ok(vec![]));
        let repo = ListingRepository::new(Arc::new(store), signed_in_gate());
        repo.dashboard().await.unwrap();
    }

    #[tokio::test]
    async fn owner_filter_is_gated_like_the_dashboard() {
        let mut store = MockListingStore::new();
        store.expect_query().never();

        let repo = ListingRepository::new(Arc::new(store), signed_in_gate());
        let other = repo.list(ListingFilter::OwnedBy("u2".into())).await;
        assert!(matches!(other, Err(DomainError::Unauthorized(_))));

        let signed_out = Arc::new(SessionGate::new());
        signed_out.apply(None);
        let mut store = MockListingStore::new();
        store.expect_query().never();
        let repo = ListingRepository::new(Arc::new(store), signed_out);
        let own = repo.list(ListingFilter::OwnedBy("u1".into())).await;
        assert!(matches!(own, Err(DomainError::Unauthorized(_))));
    }
}
