//! Ingestor tests against an in-memory SQLite store.

use std::io::Cursor;

use chrono::NaiveDate;
use vitalog_core::{Category, ReadingStore};
use vitalog_store_sqlite::SqliteStore;

use crate::{Error, Ingestor};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory().await.expect("in-memory store")
}

fn export(records: &str) -> Cursor<Vec<u8>> {
  Cursor::new(format!("<HealthData>{records}</HealthData>").into_bytes())
}

fn day(s: &str) -> NaiveDate { s.parse().unwrap() }

const STEPS: &str = "HKQuantityTypeIdentifierStepCount";

fn step_record(ts: &str, value: u32) -> String {
  format!(
    "<Record type=\"{STEPS}\" startDate=\"{ts}\" endDate=\"{ts}\" \
     value=\"{value}\" unit=\"count\"/>"
  )
}

// ─── Classification and normalisation ────────────────────────────────────────

#[tokio::test]
async fn ingest_classifies_normalises_and_inserts() {
  let s = store().await;
  let xml = export(&format!(
    "{}{}\
     <Record type=\"HKCategoryTypeIdentifierSleepAnalysis\" \
       startDate=\"2024-01-15 23:10:00 -0700\" \
       endDate=\"2024-01-16 06:40:00 -0700\" \
       value=\"HKCategoryValueSleepAnalysisAsleep\"/>\
     <Workout workoutActivityType=\"HKWorkoutActivityTypeRunning\" \
       startDate=\"2024-01-15 18:00:00 -0700\" \
       endDate=\"2024-01-15 18:42:00 -0700\" \
       duration=\"42.5\" durationUnit=\"min\" totalEnergyBurned=\"410\"/>",
    step_record("2024-01-15 08:30:00 -0700", 523),
    step_record("2024-01-15 09:00:00 -0700", 1200),
  ));

  let report = Ingestor::new()
    .ingest(xml, "apple_health", &s, |_| {})
    .await
    .unwrap();
  assert_eq!(report.raw_count, 4);
  assert_eq!(report.inserted, 4);
  assert_eq!(report.skipped, 0);

  let steps = s
    .readings_for_day("apple_health", Category::Activity, day("2024-01-15"))
    .await
    .unwrap();
  assert_eq!(steps.len(), 2);
  assert_eq!(steps[0].timestamp, "2024-01-15T08:30:00-07:00");
  assert_eq!(steps[0].value, Some(523.0));
  assert_eq!(steps[0].short_name, "Steps");

  // The sleep stage name is non-numeric and coerces to an absent value.
  let sleep = s
    .readings_for_day("apple_health", Category::Sleep, day("2024-01-15"))
    .await
    .unwrap();
  assert_eq!(sleep.len(), 1);
  assert_eq!(sleep[0].value, None);
  assert_eq!(sleep[0].end_timestamp.as_deref(), Some("2024-01-16T06:40:00-07:00"));

  let workouts = s
    .readings_for_day("apple_health", Category::Workout, day("2024-01-15"))
    .await
    .unwrap();
  assert_eq!(workouts.len(), 1);
  assert_eq!(workouts[0].short_name, "Running");
  assert_eq!(workouts[0].value, Some(42.5));
  assert_eq!(workouts[0].metadata["energy_burned"], 410.0);
}

#[tokio::test]
async fn unknown_type_contributes_nothing() {
  let s = store().await;
  let xml = export(
    "<Record type=\"HKQuantityTypeIdentifierAudioExposure\" \
       startDate=\"2024-01-15 08:30:00 -0700\" value=\"70\"/>",
  );

  let report = Ingestor::new()
    .ingest(xml, "apple_health", &s, |_| {})
    .await
    .unwrap();
  assert_eq!(report.raw_count, 0);
  assert_eq!(report.inserted, 0);
  assert_eq!(report.skipped, 0);
}

#[tokio::test]
async fn record_without_start_date_is_skipped() {
  let s = store().await;
  let xml = export(&format!(
    "<Record type=\"{STEPS}\" value=\"100\"/>{}",
    step_record("2024-01-15 08:30:00 -0700", 523),
  ));

  let report = Ingestor::new()
    .ingest(xml, "apple_health", &s, |_| {})
    .await
    .unwrap();
  assert_eq!(report.raw_count, 1);
  assert_eq!(report.inserted, 1);
}

#[tokio::test]
async fn workout_defaults_activity_and_duration_unit() {
  let s = store().await;
  let xml = export(
    "<Workout startDate=\"2024-01-15 18:00:00 -0700\" \
      endDate=\"2024-01-15 18:30:00 -0700\"/>",
  );

  let report = Ingestor::new()
    .ingest(xml, "apple_health", &s, |_| {})
    .await
    .unwrap();
  assert_eq!(report.inserted, 1);

  let workouts = s
    .readings_for_day("apple_health", Category::Workout, day("2024-01-15"))
    .await
    .unwrap();
  assert_eq!(workouts[0].short_name, "Unknown");
  assert_eq!(workouts[0].unit, "min");
  assert_eq!(workouts[0].value, None);
}

// ─── Deduplication ───────────────────────────────────────────────────────────

#[tokio::test]
async fn reingesting_the_same_export_is_idempotent() {
  let s = store().await;
  let records = format!(
    "{}{}",
    step_record("2024-01-15 08:30:00 -0700", 523),
    step_record("2024-01-15 09:00:00 -0700", 1200),
  );

  let first = Ingestor::new()
    .ingest(export(&records), "apple_health", &s, |_| {})
    .await
    .unwrap();
  assert_eq!(first.inserted, 2);

  let second = Ingestor::new()
    .ingest(export(&records), "apple_health", &s, |_| {})
    .await
    .unwrap();
  assert_eq!(second.inserted, 0);
  assert_eq!(second.skipped, second.raw_count);

  let counts = s.category_counts("apple_health").await.unwrap();
  assert_eq!(counts, vec![(Category::Activity, 2)]);
}

#[tokio::test]
async fn absent_values_share_a_dedup_identity() {
  let s = store().await;
  // Same timestamp, same type, both values non-numeric: one logical
  // measurement, ingested once.
  let record = "<Record type=\"HKCategoryTypeIdentifierSleepAnalysis\" \
    startDate=\"2024-01-15 23:10:00 -0700\" \
    value=\"HKCategoryValueSleepAnalysisAsleep\"/>";
  let xml = export(&format!("{record}{record}"));

  let report = Ingestor::new()
    .ingest(xml, "apple_health", &s, |_| {})
    .await
    .unwrap();
  assert_eq!(report.raw_count, 2);
  assert_eq!(report.inserted, 1);
  assert_eq!(report.skipped, 1);
}

// ─── Batching ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn batch_boundaries_flush_in_parse_order() {
  let s = store().await;
  // 2 × threshold + 1 records: two full batches plus one singleton.
  let records: String = (0..5)
    .map(|i| step_record(&format!("2024-01-15 08:{i:02}:00 -0700"), 100 + i))
    .collect();

  let mut progress = Vec::new();
  let report = Ingestor::new()
    .with_batch_size(2)
    .ingest(export(&records), "apple_health", &s, |n| progress.push(n))
    .await
    .unwrap();

  assert_eq!(report.raw_count, 5);
  assert_eq!(report.inserted, 5);
  // Two full-batch flushes plus the end-of-stream flush.
  assert_eq!(progress, vec![2, 4, 5]);
}

// ─── Failure paths ───────────────────────────────────────────────────────────

#[tokio::test]
async fn malformed_stream_flushes_partial_batch_then_errors() {
  let s = store().await;
  let xml = Cursor::new(
    format!(
      "<HealthData>{}</Mismatch></HealthData>",
      step_record("2024-01-15 08:30:00 -0700", 523),
    )
    .into_bytes(),
  );

  let err = Ingestor::new()
    .ingest(xml, "apple_health", &s, |_| {})
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Xml(_)), "got {err:?}");

  // The record parsed before the error was still committed best-effort.
  let counts = s.category_counts("apple_health").await.unwrap();
  assert_eq!(counts, vec![(Category::Activity, 1)]);
}
