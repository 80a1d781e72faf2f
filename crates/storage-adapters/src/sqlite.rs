//! # SQLite document store
//!
//! Keeps each listing as a JSON body in the `cars` table. The fields the
//! queries need (`ownerUid`, `name`, `createdAt`) are copied into indexed
//! columns on insert; the body itself is returned untouched so the schema is
//! still enforced by the caller at the read boundary.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use domains::{ListingId, ListingQuery, ListingStore, RawDocument, StoreError};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::warn;
use uuid::Uuid;

use crate::memory::created_at;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cars (
    id            TEXT PRIMARY KEY,
    owner_uid     TEXT,
    name          TEXT,
    created_at_us INTEGER,
    body          TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS cars_owner_uid ON cars (owner_uid);
CREATE INDEX IF NOT EXISTS cars_name ON cars (name);
CREATE INDEX IF NOT EXISTS cars_created_at ON cars (created_at_us);
";

fn unavailable(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

pub struct SqliteListingStore {
    pool: SqlitePool,
}

impl SqliteListingStore {
    /// Opens (creating if missing) the database and applies the schema.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(unavailable)?
            .create_if_missing(true);

        // An in-memory database lives and dies with its single connection.
        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(4)
        };
        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(unavailable)?;

        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .map_err(unavailable)?;
        Ok(Self { pool })
    }

    fn to_document(row: SqliteRow) -> Result<RawDocument, StoreError> {
        let id: String = row.try_get("id").map_err(unavailable)?;
        let body: String = row.try_get("body").map_err(unavailable)?;
        let data = serde_json::from_str(&body).unwrap_or_else(|error| {
            warn!(listing_id = %id, %error, "stored body is not valid JSON");
            Value::Null
        });
        Ok(RawDocument {
            id: ListingId::new(id),
            data,
        })
    }
}

#[async_trait]
impl ListingStore for SqliteListingStore {
    async fn insert(&self, document: Value) -> Result<ListingId, StoreError> {
        let id = Uuid::new_v4().simple().to_string();
        let owner_uid = document.get("ownerUid").and_then(Value::as_str);
        let name = document.get("name").and_then(Value::as_str);
        let created_at_us = created_at(&document).map(|ts| ts.timestamp_micros());

        sqlx::query(
            "INSERT INTO cars (id, owner_uid, name, created_at_us, body) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(owner_uid)
        .bind(name)
        .bind(created_at_us)
        .bind(document.to_string())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(ListingId::new(id))
    }

    async fn get(&self, id: &ListingId) -> Result<Option<RawDocument>, StoreError> {
        let row = sqlx::query("SELECT id, body FROM cars WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;
        row.map(Self::to_document).transpose()
    }

    async fn query(&self, query: &ListingQuery) -> Result<Vec<RawDocument>, StoreError> {
        let rows = match query {
            ListingQuery::Newest => {
                sqlx::query(
                    "SELECT id, body FROM cars WHERE created_at_us IS NOT NULL \
                     ORDER BY created_at_us DESC",
                )
                .fetch_all(&self.pool)
                .await
            }
            ListingQuery::OwnedBy(uid) => {
                sqlx::query("SELECT id, body FROM cars WHERE owner_uid = ? ORDER BY id")
                    .bind(uid.as_str())
                    .fetch_all(&self.pool)
                    .await
            }
            // TEXT uses BINARY collation: byte order of UTF-8, i.e. code-point order.
            ListingQuery::NameRange(range) => {
                sqlx::query("SELECT id, body FROM cars WHERE name >= ? AND name < ? ORDER BY name")
                    .bind(range.lower())
                    .bind(range.upper())
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(unavailable)?;

        rows.into_iter().map(Self::to_document).collect()
    }

    async fn delete(&self, id: &ListingId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM cars WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
