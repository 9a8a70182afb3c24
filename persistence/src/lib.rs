//! # Adaptive Run Persistence
//!
//! Atomic, file-backed implementation of `core::traits::PersistenceStore`.
//! CloudKit-style schema evolution is explicitly out of scope; this crate
//! still carries a lightweight `schema_version` marker so a future layout
//! change has somewhere to check before it runs against old data.

pub mod migrations;
pub mod store;

pub use store::FileStore;
