//! Reading: one atomic measurement or event.
//!
//! Readings are created exclusively by the ingestor and are immutable
//! thereafter; re-ingesting the same export must not duplicate rows, which
//! is enforced by a UNIQUE constraint on `dedup_key` at the storage layer.

use serde::{Deserialize, Serialize};

use crate::Category;

/// A single normalised measurement from a source export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
  /// Owning data-source identity (e.g. `"apple_health"`).
  pub entity_id:     String,
  /// Provenance tag for the export format that produced this reading.
  pub source_kind:   String,
  /// Raw source-specific type identifier.
  pub record_type:   String,
  /// Normalised metric name within the category; stable across sources.
  pub short_name:    String,
  pub category:      Category,
  /// Primary numeric payload; absent for category-only events.
  pub value:         Option<f64>,
  pub unit:          String,
  /// Canonical offset-aware instant, e.g. `"2024-01-15T08:30:00-07:00"`.
  pub timestamp:     String,
  pub end_timestamp: Option<String>,
  /// Category-specific extra payload (e.g. workout energy burned).
  pub metadata:      serde_json::Map<String, serde_json::Value>,
  /// Deterministic identity used to suppress duplicate ingestion.
  pub dedup_key:     String,
}

impl Reading {
  /// Dedup identity for a point measurement:
  /// `timestamp | record_type | value-or-"null"`.
  pub fn dedup_key(
    timestamp: &str,
    record_type: &str,
    value: Option<f64>,
  ) -> String {
    match value {
      Some(v) => format!("{timestamp}|{record_type}|{v}"),
      None => format!("{timestamp}|{record_type}|null"),
    }
  }

  /// Dedup identity for a workout session:
  /// `timestamp | "Workout" | activity_type`.
  pub fn workout_dedup_key(timestamp: &str, activity_type: &str) -> String {
    format!("{timestamp}|Workout|{activity_type}")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dedup_key_for_values_and_absent() {
    assert_eq!(
      Reading::dedup_key(
        "2024-01-15T08:30:00-07:00",
        "HKQuantityTypeIdentifierStepCount",
        Some(523.0)
      ),
      "2024-01-15T08:30:00-07:00|HKQuantityTypeIdentifierStepCount|523"
    );
    assert_eq!(
      Reading::dedup_key(
        "2024-01-15T23:10:00-07:00",
        "HKCategoryTypeIdentifierSleepAnalysis",
        None
      ),
      "2024-01-15T23:10:00-07:00|HKCategoryTypeIdentifierSleepAnalysis|null"
    );
  }

  #[test]
  fn workout_dedup_key_uses_activity_type() {
    assert_eq!(
      Reading::workout_dedup_key(
        "2024-01-15T18:00:00-07:00",
        "HKWorkoutActivityTypeRunning"
      ),
      "2024-01-15T18:00:00-07:00|Workout|HKWorkoutActivityTypeRunning"
    );
  }
}
