//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as the canonical strings produced by the
//! ingestor; dates as `YYYY-MM-DD`. Metadata and structured digests are
//! stored as compact JSON.

use chrono::NaiveDate;
use vitalog_core::{Category, DailySummary, Reading};

use crate::{Error, Result};

// ─── Date ────────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Category ────────────────────────────────────────────────────────────────

pub fn decode_category(s: &str) -> Result<Category> {
  Ok(s.parse::<Category>()?)
}

// ─── Reading rows ────────────────────────────────────────────────────────────

/// A readings row as it comes off the wire, before JSON/category decoding.
pub struct RawReading {
  pub entity_id:     String,
  pub source_kind:   String,
  pub record_type:   String,
  pub short_name:    String,
  pub category:      String,
  pub value:         Option<f64>,
  pub unit:          String,
  pub timestamp:     String,
  pub end_timestamp: Option<String>,
  pub metadata:      String,
  pub dedup_key:     String,
}

impl RawReading {
  pub fn into_reading(self) -> Result<Reading> {
    Ok(Reading {
      entity_id:     self.entity_id,
      source_kind:   self.source_kind,
      record_type:   self.record_type,
      short_name:    self.short_name,
      category:      decode_category(&self.category)?,
      value:         self.value,
      unit:          self.unit,
      timestamp:     self.timestamp,
      end_timestamp: self.end_timestamp,
      metadata:      serde_json::from_str(&self.metadata)?,
      dedup_key:     self.dedup_key,
    })
  }
}

/// A reading with all columns pre-encoded, ready to bind.
pub struct EncodedReading {
  pub entity_id:     String,
  pub source_kind:   String,
  pub record_type:   String,
  pub short_name:    String,
  pub category:      &'static str,
  pub value:         Option<f64>,
  pub unit:          String,
  pub timestamp:     String,
  pub end_timestamp: Option<String>,
  pub metadata:      String,
  pub dedup_key:     String,
}

pub fn encode_reading(r: Reading) -> EncodedReading {
  EncodedReading {
    entity_id:     r.entity_id,
    source_kind:   r.source_kind,
    record_type:   r.record_type,
    short_name:    r.short_name,
    category:      r.category.as_str(),
    value:         r.value,
    unit:          r.unit,
    timestamp:     r.timestamp,
    end_timestamp: r.end_timestamp,
    metadata:      serde_json::Value::Object(r.metadata).to_string(),
    dedup_key:     r.dedup_key,
  }
}

// ─── Summary rows ────────────────────────────────────────────────────────────

/// A summaries row before date/category/JSON decoding.
pub struct RawSummary {
  pub entity_id:       String,
  pub date:            String,
  pub category:        String,
  pub narrative:       String,
  pub structured_data: String,
}

impl RawSummary {
  pub fn into_summary(self) -> Result<DailySummary> {
    Ok(DailySummary {
      entity_id:       self.entity_id,
      date:            decode_date(&self.date)?,
      category:        decode_category(&self.category)?,
      narrative:       self.narrative,
      structured_data: serde_json::from_str(&self.structured_data)?,
    })
  }
}
