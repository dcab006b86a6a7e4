//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use incidents_core::{AsDomain, Error as CoreError};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("unprocessable: {0}")]
  Unprocessable(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error(transparent)]
  Auth(#[from] AuthError),

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Translate a store failure, surfacing the domain error it wraps if any.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + AsDomain + Send + Sync + 'static,
  {
    match err.as_domain() {
      Some(domain) => domain.clone().into(),
      None => Self::Internal(Box::new(err)),
    }
  }

  pub fn internal(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Internal(Box::new(err))
  }
}

impl From<CoreError> for ApiError {
  fn from(err: CoreError) -> Self {
    match err {
      CoreError::NotFound { .. } => Self::NotFound(err.to_string()),
      CoreError::Conflict(_) => Self::Conflict(err.to_string()),
      CoreError::InvalidRole(_)
      | CoreError::InvalidSeverity(_)
      | CoreError::InvalidDateRange(_)
      | CoreError::UnknownPerson(_)
      | CoreError::Validation { .. } => Self::Unprocessable(err.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Auth(e) => {
        tracing::warn!(error = %e, "rejected request");
        return (
          StatusCode::UNAUTHORIZED,
          [(header::WWW_AUTHENTICATE, "Bearer")],
          Json(json!({ "error": "unauthorized", "message": "unauthorized" })),
        )
          .into_response();
      }
      ApiError::Internal(e) => {
        tracing::error!(error = %e, "internal error");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
      }
    };
    // `message` duplicates `error` for clients that read that key.
    (status, Json(json!({ "error": message, "message": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn domain_errors_pick_their_status() {
    let cases = [
      (CoreError::not_found("person", "p-1"), StatusCode::NOT_FOUND),
      (CoreError::InvalidRole("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
      (CoreError::InvalidSeverity("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
      (CoreError::InvalidDateRange("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
      (CoreError::UnknownPerson("p".into()), StatusCode::UNPROCESSABLE_ENTITY),
      (CoreError::validation("name", "empty"), StatusCode::UNPROCESSABLE_ENTITY),
      (CoreError::Conflict("taken".into()), StatusCode::CONFLICT),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(err).into_response().status(), status);
    }
  }

  #[test]
  fn auth_failures_are_401_with_challenge() {
    let resp = ApiError::from(AuthError::MissingToken).into_response();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers()[header::WWW_AUTHENTICATE], "Bearer");
  }

  #[test]
  fn internal_errors_are_masked() {
    let io = std::io::Error::other("disk on fire");
    let resp = ApiError::internal(io).into_response();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }
}
