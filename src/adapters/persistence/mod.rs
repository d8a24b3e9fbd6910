//! Persistence Adapters - Profile Storage
//!
//! Implements the `ProfileRepository` port with atomic per-user JSON
//! files, plus an in-memory variant for tests and dry runs.

pub mod json_store;
pub mod memory;

pub use json_store::JsonProfileStore;
pub use memory::MemoryProfileStore;
