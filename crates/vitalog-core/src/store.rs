//! The `ReadingStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `vitalog-store-sqlite`). The ingestion and summarisation layers depend
//! on this abstraction, not on any concrete backend. The handle lifecycle
//! (open/close) is owned by the caller; pipelines only borrow it for the
//! scope of one call.

use std::{collections::HashMap, future::Future};

use chrono::NaiveDate;

use crate::{BaselineStat, Category, DailySummary, Reading};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`ReadingStore::search_summaries`].
#[derive(Debug, Clone, Default)]
pub struct SummaryQuery {
  /// Free-text query matched against summary narratives.
  pub text:     String,
  pub category: Option<Category>,
  /// Inclusive lower bound on the summary date.
  pub start:    Option<NaiveDate>,
  /// Inclusive upper bound on the summary date.
  pub end:      Option<NaiveDate>,
  /// Maximum rows returned; backends default this to 20.
  pub limit:    Option<usize>,
}

impl SummaryQuery {
  pub fn new(text: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      ..Self::default()
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a vitalog storage backend.
///
/// Readings are append-only with ignore-on-duplicate semantics keyed by
/// `dedup_key`; summaries are replace-on-conflict keyed by
/// `(entity_id, date, category)`.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait ReadingStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert a batch of readings inside one transaction. Rows whose
  /// `dedup_key` already exists are silently ignored. Returns the number
  /// of rows newly inserted.
  fn insert_readings_batch(
    &self,
    readings: Vec<Reading>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Insert or wholesale-replace the summary for its
  /// `(entity_id, date, category)` triple.
  fn upsert_summary(
    &self,
    summary: DailySummary,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Summarisation reads ───────────────────────────────────────────────

  /// All readings for one entity/category/calendar-day, ordered by
  /// timestamp.
  fn readings_for_day<'a>(
    &'a self,
    entity_id: &'a str,
    category: Category,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Reading>, Self::Error>> + Send + 'a;

  /// Per-short-name statistics over `[date - 7 days, date)`, the
  /// summarised day itself excluded. Only non-null values contribute.
  fn trailing_baseline<'a>(
    &'a self,
    entity_id: &'a str,
    category: Category,
    date: NaiveDate,
  ) -> impl Future<Output = Result<HashMap<String, BaselineStat>, Self::Error>>
  + Send
  + 'a;

  /// Distinct (day, category) pairs that have at least one reading but no
  /// summary row yet, ordered by date.
  fn missing_summary_days<'a>(
    &'a self,
    entity_id: &'a str,
  ) -> impl Future<Output = Result<Vec<(NaiveDate, Category)>, Self::Error>>
  + Send
  + 'a;

  // ── Reporting reads ───────────────────────────────────────────────────

  /// Reading counts per category for one entity.
  fn category_counts<'a>(
    &'a self,
    entity_id: &'a str,
  ) -> impl Future<Output = Result<Vec<(Category, u64)>, Self::Error>> + Send + 'a;

  /// Full-text search over summary narratives, most relevant first.
  fn search_summaries<'a>(
    &'a self,
    query: &'a SummaryQuery,
  ) -> impl Future<Output = Result<Vec<DailySummary>, Self::Error>> + Send + 'a;
}
