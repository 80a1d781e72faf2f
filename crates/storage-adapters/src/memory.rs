//! In-memory record and blob stores.
//!
//! Both behave like their remote counterparts as far as the ports can tell:
//! ids are assigned by the store, queries evaluate against raw JSON
//! documents, and deleting something absent reports `NotFound`.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use domains::{
    BlobPath, BlobStore, ListingId, ListingQuery, ListingStore, RawDocument, StoreError,
};
use mime::Mime;
use serde_json::Value;
use uuid::Uuid;

/// `createdAt` of a raw document, if present and well-formed.
pub(crate) fn created_at(data: &Value) -> Option<DateTime<Utc>> {
    let raw = data.get("createdAt")?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

fn string_field<'a>(data: &'a Value, field: &str) -> Option<&'a str> {
    data.get(field)?.as_str()
}

/// Evaluates a query over a snapshot of documents.
pub(crate) fn run_query(mut snapshot: Vec<RawDocument>, query: &ListingQuery) -> Vec<RawDocument> {
    match query {
        ListingQuery::Newest => {
            let mut dated: Vec<_> = snapshot
                .into_iter()
                .filter_map(|doc| created_at(&doc.data).map(|ts| (ts, doc)))
                .collect();
            dated.sort_by(|(a, _), (b, _)| b.cmp(a));
            dated.into_iter().map(|(_, doc)| doc).collect()
        }
        ListingQuery::OwnedBy(uid) => {
            snapshot.retain(|doc| string_field(&doc.data, "ownerUid") == Some(uid.as_str()));
            snapshot.sort_by(|a, b| a.id.cmp(&b.id));
            snapshot
        }
        ListingQuery::NameRange(range) => {
            snapshot.retain(|doc| {
                string_field(&doc.data, "name").is_some_and(|name| range.contains(name))
            });
            snapshot.sort_by(|a, b| {
                string_field(&a.data, "name").cmp(&string_field(&b.data, "name"))
            });
            snapshot
        }
    }
}

#[derive(Default)]
pub struct MemoryListingStore {
    documents: DashMap<ListingId, Value>,
}

impl MemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a document under a chosen id, bypassing id assignment.
    /// Used to seed fixtures, including documents that break the schema.
    pub fn put_document(&self, id: ListingId, data: Value) {
        self.documents.insert(id, data);
    }

    pub fn contains(&self, id: &ListingId) -> bool {
        self.documents.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn snapshot(&self) -> Vec<RawDocument> {
        self.documents
            .iter()
            .map(|entry| RawDocument {
                id: entry.key().clone(),
                data: entry.value().clone(),
            })
            .collect()
    }
}

#[async_trait]
impl ListingStore for MemoryListingStore {
    async fn insert(&self, document: Value) -> Result<ListingId, StoreError> {
        let id = ListingId::new(Uuid::new_v4().simple().to_string());
        self.documents.insert(id.clone(), document);
        Ok(id)
    }

    async fn get(&self, id: &ListingId) -> Result<Option<RawDocument>, StoreError> {
        Ok(self.documents.get(id).map(|entry| RawDocument {
            id: id.clone(),
            data: entry.value().clone(),
        }))
    }

    async fn query(&self, query: &ListingQuery) -> Result<Vec<RawDocument>, StoreError> {
        Ok(run_query(self.snapshot(), query))
    }

    async fn delete(&self, id: &ListingId) -> Result<(), StoreError> {
        match self.documents.remove(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: Mime,
}

pub struct MemoryBlobStore {
    objects: DashMap<BlobPath, StoredObject>,
    public_url: String,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new("memory://blobs")
    }
}

impl MemoryBlobStore {
    /// `public_url` prefixes every download URL (no trailing slash needed).
    pub fn new(public_url: impl Into<String>) -> Self {
        Self {
            objects: DashMap::new(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn object(&self, path: &BlobPath) -> Option<StoredObject> {
        self.objects.get(path).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, path: &BlobPath) -> bool {
        self.objects.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, path: &BlobPath, data: Bytes, content_type: &Mime) -> Result<(), StoreError> {
        self.objects.insert(
            path.clone(),
            StoredObject {
                bytes: data,
                content_type: content_type.clone(),
            },
        );
        Ok(())
    }

    async fn download_url(&self, path: &BlobPath) -> Result<String, StoreError> {
        if !self.objects.contains_key(path) {
            return Err(StoreError::NotFound(path.to_string()));
        }
        Ok(format!("{}/{}", self.public_url, path))
    }

    async fn delete(&self, path: &BlobPath) -> Result<(), StoreError> {
        match self.objects.remove(path) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(path.to_string())),
        }
    }
}
