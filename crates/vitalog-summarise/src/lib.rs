//! Daily summarisation engine.
//!
//! For every (entity, calendar-day, category) pair that has readings but
//! no summary row yet, aggregate the day's readings by short name, fetch
//! the trailing 7-day baseline, and hand both to the category's
//! summariser. Summaries are recomputed per missing pair, never updated
//! in place mid-day; recomputation replaces the stored row wholesale.

use vitalog_core::{DailySummary, ReadingStore};

pub mod error;
pub mod metrics;
pub mod narrate;

pub use error::{Error, Result};
pub use narrate::{Narrative, narrate};

use crate::metrics::group_readings;

/// Generate a summary for every missing (day, category) pair of
/// `entity_id`. Returns the number of summaries written.
///
/// Days whose narrative degenerates to `"."` (every value in the
/// category was absent) are silently skipped, not an error.
pub async fn generate_summaries<S: ReadingStore>(
  store: &S,
  entity_id: &str,
) -> Result<u64> {
  let candidates = store
    .missing_summary_days(entity_id)
    .await
    .map_err(store_err)?;

  let mut written = 0u64;
  for (date, category) in candidates {
    let readings = store
      .readings_for_day(entity_id, category, date)
      .await
      .map_err(store_err)?;
    let reading_count = readings.len();

    let metrics = group_readings(&readings);
    let weekly = store
      .trailing_baseline(entity_id, category, date)
      .await
      .map_err(store_err)?;

    let Narrative { text, mut data } = narrate(category, &metrics, &weekly);
    if text.is_empty() || text == "." {
      continue;
    }

    data.insert("reading_count".to_owned(), reading_count.into());
    store
      .upsert_summary(DailySummary {
        entity_id: entity_id.to_owned(),
        date,
        category,
        narrative: text,
        structured_data: data,
      })
      .await
      .map_err(store_err)?;
    written += 1;
    tracing::debug!(%date, %category, "summary written");
  }

  tracing::info!(entity_id, written, "summarisation complete");
  Ok(written)
}

fn store_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
  Error::Store(Box::new(e))
}

#[cfg(test)]
mod tests;
