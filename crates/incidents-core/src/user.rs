//! Staff accounts.

use serde::Serialize;

/// A staff account as stored. Deliberately not `Serialize`: the password hash
/// must never reach a response body. Use [`UserSummary`] for that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
  pub id:            String,
  pub username:      String,
  /// Argon2 PHC string, e.g. `$argon2id$v=19$…`.
  pub password_hash: String,
}

/// The public face of a [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
  pub id:       String,
  pub username: String,
}

impl From<&User> for UserSummary {
  fn from(user: &User) -> Self {
    Self { id: user.id.clone(), username: user.username.clone() }
  }
}
