//! Core types and trait definitions for the vitalog health store.
//!
//! This crate is deliberately free of XML and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod category;
pub mod error;
pub mod reading;
pub mod store;
pub mod summary;
pub mod timestamp;

pub use category::Category;
pub use error::{Error, Result};
pub use reading::Reading;
pub use store::ReadingStore;
pub use summary::{BaselineStat, DailySummary};
