//! mp-store - Session persistence for Metapool
//!
//! Each session owns an isolated directory (input/processing/output/logs
//! plus a metadata file). Persistence is write-through: every mutation is
//! serialized to disk before the call returns; the in-memory cache is an
//! optimization, never the source of truth.

pub mod error;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::{ListFilter, SessionStore};
