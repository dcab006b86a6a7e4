//! Handlers for `/api/auth/*`.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use incidents_core::{store::IncidentStore, user::UserSummary};
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  auth::{CurrentUser, decoy_hash, verify_password},
  error::ApiError,
};

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub username: String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub token:   Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub user:    Option<UserSummary>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
  pub valid: bool,
  pub user:  UserSummary,
}

/// `POST /api/auth/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Response, ApiError>
where
  S: IncidentStore + Clone + 'static,
{
  let user = state
    .store
    .find_user(&body.username)
    .await
    .map_err(ApiError::store)?;

  // Unknown user and wrong password look the same from outside.
  let verified = match &user {
    Some(u) => verify_password(&body.password, &u.password_hash),
    None => {
      verify_password(&body.password, decoy_hash());
      false
    }
  };
  let user = match user {
    Some(user) if verified => user,
    _ => {
      tracing::warn!(username = %body.username, "failed login");
      let failure = LoginResponse {
        success: false,
        token:   None,
        user:    None,
        message: Some("Invalid credentials".to_owned()),
      };
      return Ok((StatusCode::UNAUTHORIZED, Json(failure)).into_response());
    }
  };

  let token = state.auth.issue_token(&user.username).map_err(ApiError::internal)?;
  tracing::info!(username = %user.username, "login");

  Ok(
    Json(LoginResponse {
      success: true,
      token:   Some(token),
      user:    Some(UserSummary::from(&user)),
      message: None,
    })
    .into_response(),
  )
}

/// `POST /api/auth/logout`
///
/// Tokens are stateless; the client discards its copy.
pub async fn logout(CurrentUser(user): CurrentUser) -> Json<serde_json::Value> {
  tracing::debug!(username = %user.username, "logout");
  Json(serde_json::json!({ "success": true, "message": "Logged out" }))
}

/// `GET /api/auth/verify`
pub async fn verify(CurrentUser(user): CurrentUser) -> Json<VerifyResponse> {
  Json(VerifyResponse { valid: true, user: UserSummary::from(&user) })
}
