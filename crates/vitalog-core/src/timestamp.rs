//! Exporter timestamp normalisation.
//!
//! Apple Health writes `"2024-01-15 08:30:00 -0700"`; the canonical form
//! stored in the database is `"2024-01-15T08:30:00-07:00"`. No timezone
//! arithmetic happens here; the offset is preserved verbatim.

/// Normalise an exporter timestamp to ISO 8601 with a colon-separated
/// offset. Anything that does not match the exporter pattern exactly is
/// returned unchanged (already-canonical or unrecognised inputs are not
/// errors at this layer).
pub fn normalize_timestamp(raw: &str) -> String {
  if is_exporter_format(raw.as_bytes()) {
    format!(
      "{}T{}{}:{}",
      &raw[0..10],
      &raw[11..19],
      &raw[20..23],
      &raw[23..25]
    )
  } else {
    raw.to_owned()
  }
}

/// Positional check for `YYYY-MM-DD HH:MM:SS ±HHMM` (25 bytes).
fn is_exporter_format(b: &[u8]) -> bool {
  if b.len() != 25 {
    return false;
  }
  let digit = |i: usize| b[i].is_ascii_digit();
  let all_digits = |r: std::ops::Range<usize>| r.clone().all(digit);

  all_digits(0..4)
    && b[4] == b'-'
    && all_digits(5..7)
    && b[7] == b'-'
    && all_digits(8..10)
    && b[10] == b' '
    && all_digits(11..13)
    && b[13] == b':'
    && all_digits(14..16)
    && b[16] == b':'
    && all_digits(17..19)
    && b[19] == b' '
    && (b[20] == b'+' || b[20] == b'-')
    && all_digits(21..25)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn exporter_format_is_rewritten() {
    assert_eq!(
      normalize_timestamp("2024-01-15 08:30:00 -0700"),
      "2024-01-15T08:30:00-07:00"
    );
    assert_eq!(
      normalize_timestamp("2023-12-31 23:59:59 +1030"),
      "2023-12-31T23:59:59+10:30"
    );
  }

  #[test]
  fn canonical_input_passes_through() {
    assert_eq!(
      normalize_timestamp("2024-01-15T08:30:00-07:00"),
      "2024-01-15T08:30:00-07:00"
    );
  }

  #[test]
  fn unrecognised_input_passes_through() {
    assert_eq!(normalize_timestamp("yesterday"), "yesterday");
    assert_eq!(normalize_timestamp(""), "");
    // Right length, wrong shape.
    assert_eq!(
      normalize_timestamp("2024/01/15 08:30:00 -0700"),
      "2024/01/15 08:30:00 -0700"
    );
  }
}
