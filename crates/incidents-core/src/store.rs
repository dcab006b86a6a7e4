//! The `IncidentStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `incidents-store-sqlite`). Higher layers (`incidents-api`,
//! `incidents-server`) depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use crate::{
  AsDomain,
  incident::{DateRange, Incident, IncidentInput},
  person::{Person, PersonInput},
  user::User,
};

/// Abstraction over an incident registry backend.
///
/// Every method is a self-contained unit of work: multi-row writes (an
/// incident plus its person associations) either commit entirely or not at
/// all. Lookups of a missing id return `None`/`false` rather than an error;
/// domain failures raised mid-write (unknown person, duplicate username) are
/// reported through [`AsDomain`].
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait IncidentStore: Send + Sync {
  type Error: std::error::Error + AsDomain + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create a user with an already-hashed password.
  ///
  /// Fails with [`crate::Error::Conflict`] if the username is taken.
  fn add_user(
    &self,
    username: String,
    password_hash: String,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Look a user up by username. Returns `None` if not found.
  fn find_user<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  // ── Persons ───────────────────────────────────────────────────────────

  fn list_persons(
    &self,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  fn get_person<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + 'a;

  /// Persist a new person; the store assigns `id` and a unique
  /// `registration_number`.
  fn create_person(
    &self,
    input: PersonInput,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Replace every mutable field of a person. Returns `None` if `id` does not
  /// exist.
  fn update_person<'a>(
    &'a self,
    id: &'a str,
    input: PersonInput,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + 'a;

  /// Delete a person and (by cascade) its incident associations. Incidents
  /// themselves are untouched. Returns `false` if `id` does not exist.
  fn delete_person<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Incidents ─────────────────────────────────────────────────────────

  /// All incidents, or only those whose `date` falls inside `range`.
  fn list_incidents(
    &self,
    range: Option<DateRange>,
  ) -> impl Future<Output = Result<Vec<Incident>, Self::Error>> + Send + '_;

  fn get_incident<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Incident>, Self::Error>> + Send + 'a;

  /// Persist a new incident and attach its persons atomically.
  ///
  /// Fails with [`crate::Error::UnknownPerson`] (and writes nothing) if any
  /// person id does not exist.
  fn create_incident(
    &self,
    input: IncidentInput,
  ) -> impl Future<Output = Result<Incident, Self::Error>> + Send + '_;

  /// Replace type, description, location and severity, and rebuild the
  /// person set from scratch, atomically. `date` and both identifiers are
  /// preserved. Returns `None` if `id` does not exist.
  fn update_incident<'a>(
    &'a self,
    id: &'a str,
    input: IncidentInput,
  ) -> impl Future<Output = Result<Option<Incident>, Self::Error>> + Send + 'a;

  /// Delete an incident and (by cascade) its associations. Persons are
  /// untouched. Returns `false` if `id` does not exist.
  fn delete_incident<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Every incident the person is involved in. Returns `None` if the person
  /// does not exist.
  fn incidents_for_person<'a>(
    &'a self,
    person_id: &'a str,
  ) -> impl Future<Output = Result<Option<Vec<Incident>>, Self::Error>> + Send + 'a;
}
