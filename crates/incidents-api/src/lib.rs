//! JSON REST API for the incident registry.
//!
//! Exposes an axum [`Router`] backed by any
//! [`incidents_core::store::IncidentStore`]. Bearer-token authentication is
//! handled here; binding sockets and loading configuration are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = incidents_api::router(state, incidents_api::cors_layer(&origins)?);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod error;
pub mod incidents;
pub mod persons;
pub mod session;
pub mod statistics;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
  Json, Router,
  http::{HeaderValue, Method, header, header::InvalidHeaderValue},
  routing::{get, post},
};
use incidents_core::store::IncidentStore;
use serde_json::{Value, json};
use thiserror::Error;
use tower_http::{
  cors::{AllowOrigin, CorsLayer},
  trace::TraceLayer,
};

pub use auth::{AuthConfig, CurrentUser, IssueError};
pub use error::ApiError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState<S: IncidentStore> {
  pub store: Arc<S>,
  pub auth:  Arc<AuthConfig>,
}

impl<S: IncidentStore> AppState<S> {
  pub fn new(store: S, auth: AuthConfig) -> Self {
    Self { store: Arc::new(store), auth: Arc::new(auth) }
  }
}

/// A `cors_origins` entry that cannot become part of the CORS policy.
#[derive(Debug, Error)]
pub enum CorsError {
  #[error("invalid origin {origin:?}: {source}")]
  InvalidOrigin {
    origin: String,
    source: InvalidHeaderValue,
  },

  /// Credentialed requests cannot be combined with `*`; list each origin.
  #[error("wildcard origin \"*\" is not allowed; list each frontend origin explicitly")]
  Wildcard,
}

/// CORS policy admitting exactly `origins` (the frontends), with the headers a
/// bearer-token client sends.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer, CorsError> {
  let origins = origins
    .iter()
    .map(|o| {
      if o.trim() == "*" {
        return Err(CorsError::Wildcard);
      }
      o.parse::<HeaderValue>()
        .map_err(|source| CorsError::InvalidOrigin { origin: o.clone(), source })
    })
    .collect::<Result<Vec<_>, _>>()?;

  Ok(
    CorsLayer::new()
      .allow_origin(AllowOrigin::list(origins))
      .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
      .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
      .allow_credentials(true),
  )
}

/// Build the full application router for `state`.
pub fn router<S>(state: AppState<S>, cors: CorsLayer) -> Router
where
  S: IncidentStore + Clone + 'static,
{
  Router::new()
    .route("/", get(root))
    // Session
    .route("/api/auth/login", post(session::login::<S>))
    .route("/api/auth/logout", post(session::logout))
    .route("/api/auth/verify", get(session::verify))
    // Persons
    .route("/api/persons", get(persons::list::<S>).post(persons::create::<S>))
    .route(
      "/api/persons/{id}",
      get(persons::get_one::<S>)
        .put(persons::update::<S>)
        .delete(persons::delete::<S>),
    )
    // Incidents
    .route("/api/incidents/public", get(incidents::list_public::<S>))
    .route("/api/incidents", get(incidents::list::<S>).post(incidents::create::<S>))
    .route("/api/incidents/by-person/{id}", get(incidents::by_person::<S>))
    .route(
      "/api/incidents/{id}",
      get(incidents::get_one::<S>)
        .put(incidents::update::<S>)
        .delete(incidents::delete::<S>),
    )
    // Statistics
    .route("/api/statistics", get(statistics::handler::<S>))
    .layer(cors)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

async fn root() -> Json<Value> {
  Json(json!({
    "message": "Incident registry API",
    "version": env!("CARGO_PKG_VERSION"),
  }))
}
