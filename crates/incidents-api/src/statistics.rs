//! `GET /api/statistics?start_date=…&end_date=…`

use axum::{
  Json,
  extract::{Query, State},
};
use incidents_core::{incident::DateRange, stats::Statistics, store::IncidentStore};
use serde::Deserialize;

use crate::{AppState, auth::CurrentUser, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct StatisticsParams {
  pub start_date: Option<String>,
  pub end_date:   Option<String>,
}

impl StatisticsParams {
  /// A range only applies when both bounds are present.
  pub fn range(&self) -> Result<Option<DateRange>, ApiError> {
    match (self.start_date.as_deref(), self.end_date.as_deref()) {
      (Some(start), Some(end)) => Ok(Some(DateRange::parse(start, end)?)),
      _ => Ok(None),
    }
  }
}

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  _: CurrentUser,
  Query(params): Query<StatisticsParams>,
) -> Result<Json<Statistics>, ApiError>
where
  S: IncidentStore + Clone + 'static,
{
  let range = params.range()?;
  let incidents = state.store.list_incidents(range).await.map_err(ApiError::store)?;
  Ok(Json(Statistics::from_incidents(&incidents)))
}
