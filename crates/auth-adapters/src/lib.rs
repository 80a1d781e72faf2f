//! Authentication provider adapters.
//!
//! `InMemoryAuthProvider` hashes passwords with Argon2 and keeps accounts in
//! process memory. It is what the seeder and the integration tests run against.

pub mod memory;

pub use memory::InMemoryAuthProvider;
