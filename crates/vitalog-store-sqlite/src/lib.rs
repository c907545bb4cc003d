//! SQLite backend for the vitalog reading store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Deduplication is enforced
//! here, by the UNIQUE constraint on `readings.dedup_key`, rather than
//! precomputed in memory by the ingestor.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
