//! Per-day grouping of readings into metric accumulators.
//!
//! Built once per (entity, day, category) call and discarded afterwards;
//! no state crosses calls.

use std::collections::{BTreeMap, HashMap};

use vitalog_core::{BaselineStat, Reading};

/// Grouped readings for one metric on one day.
#[derive(Debug, Clone)]
pub struct DayMetric {
  pub short_name:     String,
  pub record_type:    String,
  /// Unit of the first reading seen for this metric.
  pub unit:           String,
  /// Numeric values in timestamp order; absent values excluded.
  pub values:         Vec<f64>,
  /// End timestamps in timestamp order, one entry per reading, including
  /// readings whose primary value was absent. Their length is the
  /// occurrence count for category-only metrics.
  pub end_timestamps: Vec<Option<String>>,
}

impl DayMetric {
  /// Number of readings seen, value-carrying or not.
  pub fn occurrences(&self) -> usize { self.end_timestamps.len() }

  /// Sum of the present values.
  pub fn total(&self) -> f64 { self.values.iter().sum() }

  /// Mean of the present values; 0 when none are present.
  pub fn mean(&self) -> f64 {
    if self.values.is_empty() {
      0.0
    } else {
      self.total() / self.values.len() as f64
    }
  }

  /// The most recent value, used for point-in-time metrics (weight, BMI,
  /// body fat, VO2 max) where the last reading wins over any average.
  pub fn last_value(&self) -> Option<f64> { self.values.last().copied() }
}

/// Metric accumulators for one day/category, keyed by short name.
pub type DayMetrics = BTreeMap<String, DayMetric>;

/// Trailing 7-day statistics keyed by short name.
pub type WeeklyBaseline = HashMap<String, BaselineStat>;

/// Group a day's readings (already in timestamp order) by short name.
pub fn group_readings(readings: &[Reading]) -> DayMetrics {
  let mut metrics = DayMetrics::new();
  for r in readings {
    let m = metrics
      .entry(r.short_name.clone())
      .or_insert_with(|| DayMetric {
        short_name:     r.short_name.clone(),
        record_type:    r.record_type.clone(),
        unit:           r.unit.clone(),
        values:         Vec::new(),
        end_timestamps: Vec::new(),
      });
    if let Some(v) = r.value {
      m.values.push(v);
    }
    m.end_timestamps.push(r.end_timestamp.clone());
  }
  metrics
}

/// Shorthand for the summed value of a metric that may be absent.
pub fn total_of(metrics: &DayMetrics, short_name: &str) -> f64 {
  metrics.get(short_name).map_or(0.0, DayMetric::total)
}
