//! Handlers for `/api/persons`.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use incidents_core::{
  Error as CoreError,
  person::{Person, PersonInput},
  store::IncidentStore,
};
use serde::Deserialize;

use crate::{AppState, auth::CurrentUser, error::ApiError};

// ─── Request body ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PersonBody {
  pub name:    String,
  pub address: String,
  pub role:    String,
  pub phone:   String,
  pub email:   String,
}

impl TryFrom<PersonBody> for PersonInput {
  type Error = CoreError;

  fn try_from(b: PersonBody) -> Result<Self, Self::Error> {
    PersonInput::parse(b.name, b.address, &b.role, b.phone, b.email)
  }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `GET /api/persons`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _: CurrentUser,
) -> Result<Json<Vec<Person>>, ApiError>
where
  S: IncidentStore + Clone + 'static,
{
  let persons = state.store.list_persons().await.map_err(ApiError::store)?;
  Ok(Json(persons))
}

/// `POST /api/persons`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<PersonBody>,
) -> Result<(StatusCode, Json<Person>), ApiError>
where
  S: IncidentStore + Clone + 'static,
{
  let input = PersonInput::try_from(body)?;
  let person = state.store.create_person(input).await.map_err(ApiError::store)?;
  tracing::info!(
    person = %person.id,
    registration_number = %person.registration_number,
    by = %user.username,
    "person created"
  );
  Ok((StatusCode::CREATED, Json(person)))
}

/// `GET /api/persons/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _: CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<Person>, ApiError>
where
  S: IncidentStore + Clone + 'static,
{
  state
    .store
    .get_person(&id)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| CoreError::not_found("person", id).into())
}

/// `PUT /api/persons/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<String>,
  Json(body): Json<PersonBody>,
) -> Result<Json<Person>, ApiError>
where
  S: IncidentStore + Clone + 'static,
{
  let input = PersonInput::try_from(body)?;
  let person = state
    .store
    .update_person(&id, input)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| CoreError::not_found("person", id.as_str()))?;
  tracing::info!(person = %person.id, by = %user.username, "person updated");
  Ok(Json(person))
}

/// `DELETE /api/persons/{id}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: IncidentStore + Clone + 'static,
{
  if !state.store.delete_person(&id).await.map_err(ApiError::store)? {
    return Err(CoreError::not_found("person", id).into());
  }
  tracing::info!(person = %id, by = %user.username, "person deleted");
  Ok(StatusCode::NO_CONTENT)
}
