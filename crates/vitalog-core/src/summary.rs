//! Derived summary types.
//!
//! A [`DailySummary`] is the one narrative row per (entity, day, category);
//! a [`BaselineStat`] is the ephemeral trailing-week context used only to
//! annotate narratives; it is never persisted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Category;

/// One derived narrative per (entity, calendar day, category).
/// Recomputation replaces the prior row wholesale; there is no partial
/// merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
  pub entity_id:       String,
  pub date:            NaiveDate,
  pub category:        Category,
  /// Human-readable text; sentence-joined with `". "`, always ending in a
  /// period.
  pub narrative:       String,
  /// Numeric digest plus `reading_count`.
  pub structured_data: serde_json::Map<String, serde_json::Value>,
}

/// Per-metric statistics over the 7 calendar days strictly preceding a
/// summarised day. Discarded after the narrative is produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineStat {
  pub avg:   f64,
  pub min:   f64,
  pub max:   f64,
  /// Number of non-null values in the window.
  pub count: u64,
}
