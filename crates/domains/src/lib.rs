//! crates/domains/src/lib.rs
//!
//! The domain model and port definitions for the listing core.

pub mod contact;
pub mod errors;
pub mod models;
pub mod ports;
pub mod search;
pub mod validation;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use ports::*;
pub use search::{range_for, SearchRange, MAX_SENTINEL};
