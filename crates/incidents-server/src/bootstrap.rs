//! Startup seeding of the bootstrap account.

use incidents_core::{AsDomain, Error as CoreError, store::IncidentStore};

/// What [`seed_user`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seeded {
  Created,
  AlreadyPresent,
}

/// Create `username` with `password_hash` unless it already exists. Safe to run
/// on every start; an existing account's password is never overwritten.
pub async fn seed_user<S>(
  store: &S,
  username: &str,
  password_hash: &str,
) -> Result<Seeded, S::Error>
where
  S: IncidentStore,
{
  if store.find_user(username).await?.is_some() {
    return Ok(Seeded::AlreadyPresent);
  }
  match store.add_user(username.to_owned(), password_hash.to_owned()).await {
    Ok(user) => {
      tracing::info!(user = %user.id, username, "seeded bootstrap user");
      Ok(Seeded::Created)
    }
    // Lost a race with another writer; the account exists either way.
    Err(e) if matches!(e.as_domain(), Some(CoreError::Conflict(_))) => {
      Ok(Seeded::AlreadyPresent)
    }
    Err(e) => Err(e),
  }
}
