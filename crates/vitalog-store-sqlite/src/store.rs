//! [`SqliteStore`], the SQLite implementation of [`ReadingStore`].

use std::{collections::HashMap, path::Path};

use chrono::NaiveDate;
use vitalog_core::{
  BaselineStat, Category, DailySummary, Reading,
  store::{ReadingStore, SummaryQuery},
};

use crate::{
  Error, Result,
  encode::{RawReading, RawSummary, encode_date, encode_reading},
  schema::SCHEMA,
};

const READING_COLUMNS: &str = "entity_id, source_kind, record_type, \
   short_name, category, value, unit, timestamp, end_timestamp, metadata, \
   dedup_key";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A vitalog store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. The
/// caller owns the lifecycle: open once per process, pass by reference
/// into ingestion and summarisation, close on shutdown.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── FTS query sanitiser ─────────────────────────────────────────────────────

/// Quote each token of a free-text query so FTS5 never sees MATCH operator
/// syntax. An input with no usable tokens yields an empty string; callers
/// treat that as "no results".
fn sanitize_fts_query(raw: &str) -> String {
  let tokens: Vec<String> = raw
    .split(|c: char| !c.is_alphanumeric())
    .filter(|t| !t.is_empty())
    .map(|t| format!("\"{t}\""))
    .collect();
  tokens.join(" ")
}

// ─── ReadingStore impl ───────────────────────────────────────────────────────

impl ReadingStore for SqliteStore {
  type Error = Error;

  async fn insert_readings_batch(
    &self,
    readings: Vec<Reading>,
  ) -> Result<usize> {
    if readings.is_empty() {
      return Ok(0);
    }
    let rows: Vec<_> = readings.into_iter().map(encode_reading).collect();

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = 0usize;
        {
          let mut stmt = tx.prepare_cached(&format!(
            "INSERT OR IGNORE INTO readings ({READING_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
          ))?;
          for r in &rows {
            inserted += stmt.execute(rusqlite::params![
              r.entity_id,
              r.source_kind,
              r.record_type,
              r.short_name,
              r.category,
              r.value,
              r.unit,
              r.timestamp,
              r.end_timestamp,
              r.metadata,
              r.dedup_key,
            ])?;
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;

    tracing::debug!(inserted, "committed reading batch");
    Ok(inserted)
  }

  async fn upsert_summary(&self, summary: DailySummary) -> Result<()> {
    let entity_id = summary.entity_id;
    let date_str = encode_date(summary.date);
    let category = summary.category.as_str();
    let narrative = summary.narrative;
    let data_str =
      serde_json::Value::Object(summary.structured_data).to_string();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO summaries
             (entity_id, date, category, narrative, structured_data)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![entity_id, date_str, category, narrative, data_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn readings_for_day(
    &self,
    entity_id: &str,
    category: Category,
    date: NaiveDate,
  ) -> Result<Vec<Reading>> {
    let entity = entity_id.to_owned();
    let category_str = category.as_str();
    let date_str = encode_date(date);

    let raws: Vec<RawReading> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(&format!(
          "SELECT {READING_COLUMNS} FROM readings
           WHERE entity_id = ?1
             AND category = ?2
             AND substr(timestamp, 1, 10) = ?3
           ORDER BY timestamp"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![entity, category_str, date_str],
            |row| {
              Ok(RawReading {
                entity_id:     row.get(0)?,
                source_kind:   row.get(1)?,
                record_type:   row.get(2)?,
                short_name:    row.get(3)?,
                category:      row.get(4)?,
                value:         row.get(5)?,
                unit:          row.get(6)?,
                timestamp:     row.get(7)?,
                end_timestamp: row.get(8)?,
                metadata:      row.get(9)?,
                dedup_key:     row.get(10)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReading::into_reading).collect()
  }

  async fn trailing_baseline(
    &self,
    entity_id: &str,
    category: Category,
    date: NaiveDate,
  ) -> Result<HashMap<String, BaselineStat>> {
    let entity = entity_id.to_owned();
    let category_str = category.as_str();
    let date_str = encode_date(date);

    let rows: Vec<(String, f64, f64, f64, u64)> = self
      .conn
      .call(move |conn| {
        // Buckets days with date(), which shifts offset-bearing
        // timestamps to UTC; readings_for_day and missing_summary_days
        // bucket by the local substr prefix instead. Known mismatch,
        // keep both sides as they are or change them together.
        let mut stmt = conn.prepare_cached(
          "SELECT short_name,
                  AVG(value), MIN(value), MAX(value), COUNT(value)
           FROM readings
           WHERE entity_id = ?1
             AND category = ?2
             AND value IS NOT NULL
             AND date(timestamp) >= date(?3, '-7 days')
             AND date(timestamp) < ?3
           GROUP BY short_name",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![entity, category_str, date_str],
            |row| {
              Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
              ))
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(name, avg, min, max, count)| {
          (name, BaselineStat { avg, min, max, count })
        })
        .collect(),
    )
  }

  async fn missing_summary_days(
    &self,
    entity_id: &str,
  ) -> Result<Vec<(NaiveDate, Category)>> {
    let entity = entity_id.to_owned();

    let rows: Vec<(String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(
          "SELECT DISTINCT substr(timestamp, 1, 10) AS day, category
           FROM readings
           WHERE entity_id = ?1
             AND NOT EXISTS (
               SELECT 1 FROM summaries
               WHERE summaries.entity_id = readings.entity_id
                 AND summaries.date = substr(readings.timestamp, 1, 10)
                 AND summaries.category = readings.category
             )
           ORDER BY day",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![entity], |row| {
            Ok((row.get(0)?, row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(day, category)| {
        Ok((
          crate::encode::decode_date(&day)?,
          crate::encode::decode_category(&category)?,
        ))
      })
      .collect()
  }

  async fn category_counts(
    &self,
    entity_id: &str,
  ) -> Result<Vec<(Category, u64)>> {
    let entity = entity_id.to_owned();

    let rows: Vec<(String, u64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(
          "SELECT category, COUNT(*) FROM readings
           WHERE entity_id = ?1
           GROUP BY category
           ORDER BY category",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![entity], |row| {
            Ok((row.get(0)?, row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(c, n)| Ok((crate::encode::decode_category(&c)?, n)))
      .collect()
  }

  async fn search_summaries(
    &self,
    query: &SummaryQuery,
  ) -> Result<Vec<DailySummary>> {
    let fts = sanitize_fts_query(&query.text);
    if fts.is_empty() {
      return Ok(Vec::new());
    }

    let category_str = query.category.map(Category::as_str);
    let start_str = query.start.map(encode_date);
    let end_str = query.end.map(encode_date);
    let limit = query.limit.unwrap_or(20) as i64;

    let raws: Vec<RawSummary> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(
          "SELECT s.entity_id, s.date, s.category, s.narrative,
                  s.structured_data
           FROM summaries_fts f
           JOIN summaries s ON f.rowid = s.id
           WHERE summaries_fts MATCH ?1
             AND (?2 IS NULL OR s.category = ?2)
             AND (?3 IS NULL OR s.date >= ?3)
             AND (?4 IS NULL OR s.date <= ?4)
           ORDER BY rank
           LIMIT ?5",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![fts, category_str, start_str, end_str, limit],
            |row| {
              Ok(RawSummary {
                entity_id:       row.get(0)?,
                date:            row.get(1)?,
                category:        row.get(2)?,
                narrative:       row.get(3)?,
                structured_data: row.get(4)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSummary::into_summary).collect()
  }
}
