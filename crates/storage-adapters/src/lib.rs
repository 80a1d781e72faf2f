//! # storage-adapters
//!
//! Record-store and blob-store implementations of the `domains` ports.
//!
//! | adapter | feature |
//! |---|---|
//! | [`MemoryListingStore`], [`MemoryBlobStore`] | always |
//! | `LocalBlobStore` | `media-local` |
//! | `SqliteListingStore` | `db-sqlite` |

pub mod memory;

#[cfg(feature = "media-local")]
pub mod local;

#[cfg(feature = "db-sqlite")]
pub mod sqlite;

pub use memory::{MemoryBlobStore, MemoryListingStore, StoredObject};

#[cfg(feature = "media-local")]
pub use local::LocalBlobStore;

#[cfg(feature = "db-sqlite")]
pub use sqlite::SqliteListingStore;
