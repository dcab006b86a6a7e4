//! Password hashing, bearer tokens, and the [`CurrentUser`] extractor.

use std::sync::OnceLock;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use chrono::{Duration, Utc};
use incidents_core::{store::IncidentStore, user::User};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AppState, error::ApiError};

/// Why a request could not be authenticated. Every variant answers 401.
#[derive(Debug, Error)]
pub enum AuthError {
  #[error("missing bearer token")]
  MissingToken,

  #[error("invalid token: {0}")]
  InvalidToken(#[from] jsonwebtoken::errors::Error),

  #[error("unknown user: {0}")]
  UnknownUser(String),
}

/// Why a token could not be minted. A server-side fault, never the caller's.
#[derive(Debug, Error)]
pub enum IssueError {
  #[error("token lifetime {0} pushes the expiry past the representable range")]
  LifetimeOverflow(Duration),

  #[error("failed to sign token: {0}")]
  Sign(#[from] jsonwebtoken::errors::Error),
}

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash `password` with Argon2id and a fresh random salt, returning the PHC
/// string.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// True iff `password` matches the PHC string `hash`. A hash that does not
/// parse is a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

/// A throwaway hash verified against when the username does not exist, so a
/// miss costs about as much as a wrong password.
pub(crate) fn decoy_hash() -> &'static str {
  static DECOY: OnceLock<String> = OnceLock::new();
  DECOY.get_or_init(|| hash_password("decoy").unwrap_or_default())
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  /// Username of the authenticated user.
  pub sub: String,
  pub iat: i64,
  pub exp: i64,
}

/// Signing keys and token lifetime for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  encoding:           EncodingKey,
  decoding:           DecodingKey,
  pub token_lifetime: Duration,
}

impl AuthConfig {
  pub fn new(secret: &[u8], token_lifetime: Duration) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret),
      decoding: DecodingKey::from_secret(secret),
      token_lifetime,
    }
  }

  /// Sign an HS256 token for `username`, valid for `token_lifetime`.
  pub fn issue_token(&self, username: &str) -> Result<String, IssueError> {
    let now = Utc::now();
    let expires = now
      .checked_add_signed(self.token_lifetime)
      .ok_or(IssueError::LifetimeOverflow(self.token_lifetime))?;
    let claims = Claims {
      sub: username.to_owned(),
      iat: now.timestamp(),
      exp: expires.timestamp(),
    };
    Ok(jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
  }

  /// Check signature and expiry (no leeway) and return the claims.
  pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);
    let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)?;
    Ok(data.claims)
  }
}

/// Turn a bearer token into the user it was issued to.
pub async fn resolve<S>(
  store: &S,
  auth: &AuthConfig,
  token: &str,
) -> Result<User, ApiError>
where
  S: IncidentStore,
{
  let claims = auth.decode(token)?;
  store
    .find_user(&claims.sub)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| AuthError::UnknownUser(claims.sub).into())
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
  let value = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(AuthError::MissingToken)?;

  let (scheme, token) = value.split_once(' ').ok_or(AuthError::MissingToken)?;
  if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
    return Err(AuthError::MissingToken);
  }
  Ok(token.trim())
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The user behind the request's bearer token. Present in a handler means the
/// request was authenticated.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: IncidentStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers)?;
    let user = resolve(state.store.as_ref(), &state.auth, token).await?;
    Ok(CurrentUser(user))
  }
}
