//! Error type for `incidents-store-sqlite`.

use incidents_core::AsDomain;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] incidents_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored enum column holds a value this build does not know.
  #[error("corrupt {column} value: {value:?}")]
  Corrupt { column: &'static str, value: String },
}

impl AsDomain for Error {
  fn as_domain(&self) -> Option<&incidents_core::Error> {
    match self {
      Error::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
