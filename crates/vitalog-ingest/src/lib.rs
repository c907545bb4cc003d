//! Streaming ingestion of Apple Health export XML.
//!
//! Drives `quick-xml`'s event reader incrementally over the export (the
//! document is never materialised), classifying each `Record` element
//! through the type table, normalising timestamps, and committing readings
//! to the store in fixed-size atomic batches. `Workout` elements are always
//! accepted; they need no classifier.
//!
//! Exports can run to gigabytes; the bounded batch keeps the working set
//! at O(batch) regardless of input size, and duplicate suppression is left
//! to the store's `dedup_key` uniqueness constraint rather than an
//! in-memory index.

use std::{
  fs::File,
  io::{BufRead, BufReader},
  path::Path,
};

use quick_xml::{
  Reader,
  events::{BytesStart, Event},
};
use vitalog_core::{
  Category, Reading, ReadingStore, category::classify,
  timestamp::normalize_timestamp,
};

pub mod error;

pub use error::{Error, Result};

/// Readings per storage transaction. Caps peak memory and bounds lock
/// duration on the writer.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

const SOURCE_KIND: &str = "apple_health";

// ─── Report ──────────────────────────────────────────────────────────────────

/// Final counts for one ingestion run.
///
/// `raw_count` counts every accepted element, including those whose
/// numeric value ended up absent; elements skipped by the classifier or
/// for a missing start timestamp are not counted anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestReport {
  /// Rows newly inserted by the store.
  pub inserted:  u64,
  /// Rows ignored as duplicates of an existing `dedup_key`.
  pub skipped:   u64,
  /// Accepted source elements, before deduplication.
  pub raw_count: u64,
}

// ─── Batch sink ──────────────────────────────────────────────────────────────

/// Accumulates readings and hands full batches to the store inside one
/// transaction each. Batches commit strictly in parse order.
struct BatchSink<'s, S: ReadingStore> {
  store:    &'s S,
  capacity: usize,
  batch:    Vec<Reading>,
  inserted: u64,
  skipped:  u64,
}

impl<'s, S: ReadingStore> BatchSink<'s, S> {
  fn new(store: &'s S, capacity: usize) -> Self {
    Self {
      store,
      capacity,
      batch: Vec::with_capacity(capacity),
      inserted: 0,
      skipped: 0,
    }
  }

  /// Append a reading; returns `true` once the batch is due for a flush.
  fn push(&mut self, reading: Reading) -> bool {
    self.batch.push(reading);
    self.batch.len() >= self.capacity
  }

  async fn flush(&mut self) -> Result<()> {
    if self.batch.is_empty() {
      return Ok(());
    }
    let batch = std::mem::take(&mut self.batch);
    let len = batch.len() as u64;
    let inserted = self
      .store
      .insert_readings_batch(batch)
      .await
      .map_err(|e| Error::Store(Box::new(e)))? as u64;
    self.inserted += inserted;
    self.skipped += len - inserted;
    Ok(())
  }
}

// ─── Ingestor ────────────────────────────────────────────────────────────────

/// Configurable entry point for one ingestion run.
#[derive(Debug, Clone, Copy)]
pub struct Ingestor {
  batch_size: usize,
}

impl Default for Ingestor {
  fn default() -> Self { Self::new() }
}

impl Ingestor {
  pub fn new() -> Self {
    Self {
      batch_size: DEFAULT_BATCH_SIZE,
    }
  }

  /// Override the batch threshold (tests use small sizes to exercise
  /// flush boundaries).
  pub fn with_batch_size(mut self, batch_size: usize) -> Self {
    self.batch_size = batch_size.max(1);
    self
  }

  /// Ingest an export file. See [`Ingestor::ingest`].
  pub async fn ingest_file<S: ReadingStore>(
    &self,
    path: impl AsRef<Path>,
    entity_id: &str,
    store: &S,
    on_progress: impl FnMut(u64),
  ) -> Result<IngestReport> {
    let file = File::open(path)?;
    self
      .ingest(BufReader::new(file), entity_id, store, on_progress)
      .await
  }

  /// Drive the incremental parse over `source`, committing batches to
  /// `store` as they fill. `on_progress` is invoked with the cumulative
  /// raw-record count at every flush, including the final one.
  ///
  /// A malformed stream aborts the run: the partial batch is flushed
  /// best-effort (a secondary flush failure is discarded so it cannot
  /// mask the stream error) and the parse error is returned. A flush
  /// failure during a healthy parse propagates immediately.
  pub async fn ingest<S: ReadingStore>(
    &self,
    source: impl BufRead,
    entity_id: &str,
    store: &S,
    mut on_progress: impl FnMut(u64),
  ) -> Result<IngestReport> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);

    let mut sink = BatchSink::new(store, self.batch_size);
    let mut raw_count = 0u64;
    let mut buf = Vec::new();

    loop {
      match reader.read_event_into(&mut buf) {
        Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
          let parsed = match e.local_name().as_ref() {
            b"Record" => point_reading(e, entity_id),
            b"Workout" => workout_reading(e, entity_id),
            _ => Ok(None),
          };
          let parsed = match parsed {
            Ok(p) => p,
            Err(err) => {
              let _ = sink.flush().await;
              return Err(err);
            }
          };
          if let Some(reading) = parsed {
            raw_count += 1;
            if sink.push(reading) {
              sink.flush().await?;
              on_progress(raw_count);
            }
          }
        }
        Ok(Event::Eof) => break,
        Ok(_) => {}
        Err(e) => {
          let _ = sink.flush().await;
          return Err(Error::Xml(e.to_string()));
        }
      }
      buf.clear();
    }

    sink.flush().await?;
    on_progress(raw_count);

    let report = IngestReport {
      inserted: sink.inserted,
      skipped: sink.skipped,
      raw_count,
    };
    tracing::info!(
      entity_id,
      inserted = report.inserted,
      skipped = report.skipped,
      raw = report.raw_count,
      "ingestion complete"
    );
    Ok(report)
  }
}

// ─── Element parsing ─────────────────────────────────────────────────────────

/// Fetch one attribute by local name, unescaped. Attribute syntax errors
/// are stream-level failures, not skippable records.
fn attr(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
  for a in e.attributes() {
    let a = a.map_err(|err| Error::Xml(err.to_string()))?;
    if a.key.local_name().as_ref() == key {
      let value = a
        .unescape_value()
        .map_err(|err| Error::Xml(err.to_string()))?;
      return Ok(Some(value.into_owned()));
    }
  }
  Ok(None)
}

/// Parse a numeric attribute value. Category-only values (e.g. sleep stage
/// names) and other non-numeric text coerce to `None` rather than erroring.
fn parse_value(raw: &str) -> Option<f64> {
  raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Build a reading from a `<Record>` element. Returns `None` (not an
/// error) for unrecognised types and for records without a start
/// timestamp.
fn point_reading(
  e: &BytesStart<'_>,
  entity_id: &str,
) -> Result<Option<Reading>> {
  let Some(record_type) = attr(e, b"type")? else {
    return Ok(None);
  };
  let Some((category, short_name)) = classify(&record_type) else {
    return Ok(None);
  };
  let Some(start) = attr(e, b"startDate")? else {
    return Ok(None);
  };

  let timestamp = normalize_timestamp(&start);
  let end_timestamp = attr(e, b"endDate")?.map(|s| normalize_timestamp(&s));
  let value = attr(e, b"value")?.as_deref().and_then(parse_value);
  let unit = attr(e, b"unit")?.unwrap_or_default();
  let dedup_key = Reading::dedup_key(&timestamp, &record_type, value);

  Ok(Some(Reading {
    entity_id: entity_id.to_owned(),
    source_kind: SOURCE_KIND.to_owned(),
    record_type,
    short_name: short_name.to_owned(),
    category,
    value,
    unit,
    timestamp,
    end_timestamp,
    metadata: serde_json::Map::new(),
    dedup_key,
  }))
}

/// Build a reading from a `<Workout>` element. Workouts are always
/// accepted (there is no classifier step), with `"Unknown"` standing in
/// for a missing activity label and `"min"` for a missing duration unit.
fn workout_reading(
  e: &BytesStart<'_>,
  entity_id: &str,
) -> Result<Option<Reading>> {
  let activity_type =
    attr(e, b"workoutActivityType")?.unwrap_or_else(|| "Unknown".to_owned());
  let Some(start) = attr(e, b"startDate")? else {
    return Ok(None);
  };

  let timestamp = normalize_timestamp(&start);
  let end_timestamp = attr(e, b"endDate")?.map(|s| normalize_timestamp(&s));
  let duration = attr(e, b"duration")?.as_deref().and_then(parse_value);
  let energy = attr(e, b"totalEnergyBurned")?.as_deref().and_then(parse_value);
  let unit = attr(e, b"durationUnit")?.unwrap_or_else(|| "min".to_owned());

  let short_name = activity_type
    .strip_prefix("HKWorkoutActivityType")
    .unwrap_or(&activity_type)
    .to_owned();
  let dedup_key = Reading::workout_dedup_key(&timestamp, &activity_type);

  let mut metadata = serde_json::Map::new();
  metadata.insert(
    "activity_type".to_owned(),
    serde_json::Value::String(activity_type),
  );
  metadata.insert(
    "energy_burned".to_owned(),
    energy.map_or(serde_json::Value::Null, Into::into),
  );

  Ok(Some(Reading {
    entity_id: entity_id.to_owned(),
    source_kind: SOURCE_KIND.to_owned(),
    record_type: "HKWorkout".to_owned(),
    short_name,
    category: Category::Workout,
    value: duration,
    unit,
    timestamp,
    end_timestamp,
    metadata,
    dedup_key,
  }))
}

#[cfg(test)]
mod tests;
