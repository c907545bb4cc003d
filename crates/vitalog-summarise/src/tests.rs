//! End-to-end summarisation tests against an in-memory SQLite store.

use chrono::NaiveDate;
use vitalog_core::{Category, Reading, ReadingStore, store::SummaryQuery};
use vitalog_store_sqlite::SqliteStore;

use crate::generate_summaries;

const ENTITY: &str = "apple_health";
const STEPS: &str = "HKQuantityTypeIdentifierStepCount";
const RESTING: &str = "HKQuantityTypeIdentifierRestingHeartRate";

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory().await.expect("in-memory store")
}

fn reading(
  category: Category,
  record_type: &str,
  short_name: &str,
  timestamp: &str,
  value: Option<f64>,
  unit: &str,
) -> Reading {
  Reading {
    entity_id:     ENTITY.to_owned(),
    source_kind:   "apple_health".to_owned(),
    record_type:   record_type.to_owned(),
    short_name:    short_name.to_owned(),
    category,
    value,
    unit:          unit.to_owned(),
    timestamp:     timestamp.to_owned(),
    end_timestamp: None,
    metadata:      serde_json::Map::new(),
    dedup_key:     Reading::dedup_key(timestamp, record_type, value),
  }
}

fn steps(day: &str, hour: u32, value: f64) -> Reading {
  reading(
    Category::Activity,
    STEPS,
    "Steps",
    &format!("{day}T{hour:02}:00:00-07:00"),
    Some(value),
    "count",
  )
}

fn day(s: &str) -> NaiveDate { s.parse().unwrap() }

#[tokio::test]
async fn writes_one_summary_per_missing_day_category() {
  let s = store().await;
  s.insert_readings_batch(vec![
    steps("2024-01-15", 8, 4_000.0),
    steps("2024-01-15", 12, 4_500.0),
    steps("2024-01-16", 9, 900.0),
    reading(
      Category::Vitals,
      RESTING,
      "RestingHR",
      "2024-01-15T07:00:00-07:00",
      Some(54.0),
      "bpm",
    ),
  ])
  .await
  .unwrap();

  let written = generate_summaries(&s, ENTITY).await.unwrap();
  assert_eq!(written, 3); // activity ×2 days + vitals ×1

  let hits = s
    .search_summaries(&SummaryQuery::new("steps"))
    .await
    .unwrap();
  assert_eq!(hits.len(), 2);
  let jan15 = hits
    .iter()
    .find(|h| h.date == day("2024-01-15"))
    .expect("summary for the 15th");
  assert_eq!(jan15.category, Category::Activity);
  assert!(jan15.narrative.contains("8,500 steps"), "{}", jan15.narrative);
  assert_eq!(jan15.structured_data["reading_count"], 2);

  // Second run: no candidates remain.
  let written = generate_summaries(&s, ENTITY).await.unwrap();
  assert_eq!(written, 0);
}

#[tokio::test]
async fn baseline_annotation_spans_the_prior_week_only() {
  let s = store().await;
  // Seven prior days around 10k steps, then a 25 %-above day.
  let mut batch: Vec<Reading> = (8..15)
    .map(|d| steps(&format!("2024-01-{d:02}"), 9, 10_000.0))
    .collect();
  batch.push(steps("2024-01-15", 9, 12_500.0));
  s.insert_readings_batch(batch).await.unwrap();

  generate_summaries(&s, ENTITY).await.unwrap();

  let hits = s
    .search_summaries(&SummaryQuery::new("above weekly avg"))
    .await
    .unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].date, day("2024-01-15"));
  assert!(
    hits[0].narrative.contains("(above weekly avg of 10,000)"),
    "{}",
    hits[0].narrative
  );
}

#[tokio::test]
async fn all_absent_values_produce_no_summary() {
  let s = store().await;
  // A vitals reading whose value failed numeric parsing: candidate pair
  // exists, narrative degenerates, nothing is written.
  s.insert_readings_batch(vec![reading(
    Category::Vitals,
    "HKQuantityTypeIdentifierHeartRate",
    "HeartRate",
    "2024-01-15T08:00:00-07:00",
    None,
    "bpm",
  )])
  .await
  .unwrap();

  let written = generate_summaries(&s, ENTITY).await.unwrap();
  assert_eq!(written, 0);

  // The pair stays a candidate; it is simply skipped again next run.
  let missing = s.missing_summary_days(ENTITY).await.unwrap();
  assert_eq!(missing, vec![(day("2024-01-15"), Category::Vitals)]);
}

#[tokio::test]
async fn sleep_stage_records_are_occurrence_counted() {
  let s = store().await;
  let ts = |h: u32| format!("2024-01-15T0{h}:10:00-07:00");
  let batch: Vec<Reading> = (1..=3)
    .map(|h| {
      reading(
        Category::Sleep,
        "HKCategoryTypeIdentifierSleepAnalysis",
        "SleepAnalysis",
        &ts(h),
        None,
        "",
      )
    })
    .collect();
  s.insert_readings_batch(batch).await.unwrap();

  let written = generate_summaries(&s, ENTITY).await.unwrap();
  assert_eq!(written, 1);

  let hits = s
    .search_summaries(&SummaryQuery::new("sleep segments"))
    .await
    .unwrap();
  assert_eq!(hits[0].narrative, "Sleep: 3 sleep segments recorded.");
  assert_eq!(hits[0].structured_data["segments"], 3);
}

#[tokio::test]
async fn workout_days_summarise_each_session() {
  let s = store().await;
  let mut run = reading(
    Category::Workout,
    "HKWorkout",
    "Running",
    "2024-01-15T18:00:00-07:00",
    Some(42.0),
    "min",
  );
  run.dedup_key =
    Reading::workout_dedup_key(&run.timestamp, "HKWorkoutActivityTypeRunning");
  s.insert_readings_batch(vec![run]).await.unwrap();

  generate_summaries(&s, ENTITY).await.unwrap();

  let hits = s
    .search_summaries(&SummaryQuery::new("Running"))
    .await
    .unwrap();
  assert_eq!(hits[0].narrative, "Workout: Running, 42 min.");
  assert_eq!(hits[0].structured_data["count"], 1);
}
