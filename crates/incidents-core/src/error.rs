//! Error types for `incidents-core`.

use thiserror::Error;

/// Domain failures. Storage backends wrap these in their own error type;
/// the API layer is the only place they are turned into HTTP statuses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: String },

  #[error("invalid role {0:?}; expected one of suspect, witness, victim")]
  InvalidRole(String),

  #[error("invalid severity {0:?}; expected one of low, medium, high")]
  InvalidSeverity(String),

  #[error("invalid date range: {0}")]
  InvalidDateRange(String),

  #[error("unknown person: {0}")]
  UnknownPerson(String),

  #[error("{field}: {message}")]
  Validation {
    field:   &'static str,
    message: String,
  },

  #[error("conflict: {0}")]
  Conflict(String),
}

impl Error {
  pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
    Self::NotFound { entity, id: id.into() }
  }

  pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
    Self::Validation { field, message: message.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Implemented by backend error types so callers can recover the domain
/// error (if any) hidden behind a backend-specific wrapper.
pub trait AsDomain {
  fn as_domain(&self) -> Option<&Error>;
}

impl AsDomain for Error {
  fn as_domain(&self) -> Option<&Error> { Some(self) }
}
