//! Error type for `vitalog-ingest`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  /// The export stream itself is malformed. Fatal to the current run;
  /// whatever was batched before the error is flushed best-effort first.
  #[error("malformed export XML: {0}")]
  Xml(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
