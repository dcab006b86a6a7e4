//! Handlers for `/api/incidents`.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use incidents_core::{
  Error as CoreError,
  incident::{Incident, IncidentInput, PublicIncident},
  store::IncidentStore,
};
use serde::Deserialize;

use crate::{AppState, auth::CurrentUser, error::ApiError};

// ─── Request body ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct IncidentBody {
  #[serde(rename = "type")]
  pub kind:             String,
  pub description:      String,
  pub location:         String,
  pub severity:         String,
  #[serde(default, rename = "involvedPersons")]
  pub involved_persons: Vec<String>,
}

impl TryFrom<IncidentBody> for IncidentInput {
  type Error = CoreError;

  fn try_from(b: IncidentBody) -> Result<Self, Self::Error> {
    IncidentInput::parse(b.kind, b.description, b.location, &b.severity, b.involved_persons)
  }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `GET /api/incidents/public`, the only unauthenticated listing.
pub async fn list_public<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<PublicIncident>>, ApiError>
where
  S: IncidentStore + Clone + 'static,
{
  let incidents = state.store.list_incidents(None).await.map_err(ApiError::store)?;
  Ok(Json(incidents.iter().map(PublicIncident::from).collect()))
}

/// `GET /api/incidents`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _: CurrentUser,
) -> Result<Json<Vec<Incident>>, ApiError>
where
  S: IncidentStore + Clone + 'static,
{
  let incidents = state.store.list_incidents(None).await.map_err(ApiError::store)?;
  Ok(Json(incidents))
}

/// `POST /api/incidents`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<IncidentBody>,
) -> Result<(StatusCode, Json<Incident>), ApiError>
where
  S: IncidentStore + Clone + 'static,
{
  let input = IncidentInput::try_from(body)?;
  let incident = state.store.create_incident(input).await.map_err(ApiError::store)?;
  tracing::info!(
    incident = %incident.id,
    registration_number = %incident.registration_number,
    persons = incident.involved_persons.len(),
    by = %user.username,
    "incident created"
  );
  Ok((StatusCode::CREATED, Json(incident)))
}

/// `GET /api/incidents/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _: CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<Incident>, ApiError>
where
  S: IncidentStore + Clone + 'static,
{
  state
    .store
    .get_incident(&id)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| CoreError::not_found("incident", id).into())
}

/// `PUT /api/incidents/{id}`
///
/// Replaces the descriptive fields and the whole person set; identifiers and
/// `date` are kept.
pub async fn update<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<String>,
  Json(body): Json<IncidentBody>,
) -> Result<Json<Incident>, ApiError>
where
  S: IncidentStore + Clone + 'static,
{
  let input = IncidentInput::try_from(body)?;
  let incident = state
    .store
    .update_incident(&id, input)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| CoreError::not_found("incident", id.as_str()))?;
  tracing::info!(incident = %incident.id, by = %user.username, "incident updated");
  Ok(Json(incident))
}

/// `DELETE /api/incidents/{id}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: IncidentStore + Clone + 'static,
{
  if !state.store.delete_incident(&id).await.map_err(ApiError::store)? {
    return Err(CoreError::not_found("incident", id).into());
  }
  tracing::info!(incident = %id, by = %user.username, "incident deleted");
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/incidents/by-person/{id}`
pub async fn by_person<S>(
  State(state): State<AppState<S>>,
  _: CurrentUser,
  Path(person_id): Path<String>,
) -> Result<Json<Vec<Incident>>, ApiError>
where
  S: IncidentStore + Clone + 'static,
{
  state
    .store
    .incidents_for_person(&person_id)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| CoreError::not_found("person", person_id).into())
}
