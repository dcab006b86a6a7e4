//! [`SqliteStore`], the SQLite implementation of [`IncidentStore`].

use std::{collections::HashMap, path::Path};

use chrono::{SubsecRound as _, Utc};
use incidents_core::{
  Error as CoreError,
  ids,
  incident::{DateRange, Incident, IncidentInput},
  person::{Person, PersonInput},
  store::IncidentStore,
  user::User,
};
use rusqlite::OptionalExtension as _;

use crate::{
  Result,
  encode::{RawIncident, RawPerson, RawUser, encode_dt},
  schema::SCHEMA,
};

/// How many fresh registration numbers to try before giving up.
const REGISTRATION_ATTEMPTS: usize = 32;

const PERSON_COLUMNS: &str =
  "id, registration_number, name, address, role, phone, email";

const INCIDENT_COLUMNS: &str =
  "i.id, i.registration_number, i.type, i.description, i.location, i.date, i.severity";

// ─── Store ───────────────────────────────────────────────────────────────────

/// An incident registry backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of association rows for `incident_id`.
  #[cfg(test)]
  pub(crate) async fn association_count(&self, incident_id: &str) -> Result<u64> {
    let id = incident_id.to_owned();
    let count = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM incident_persons WHERE incident_id = ?1",
          rusqlite::params![id],
          |row| row.get::<_, i64>(0),
        )?)
      })
      .await?;
    Ok(count.max(0) as u64)
  }
}

// ─── Connection-level helpers ────────────────────────────────────────────────
//
// These run on the database thread inside `Connection::call`, usually within
// a transaction, and so take a plain `&rusqlite::Connection`.

fn row_exists(
  conn: &rusqlite::Connection,
  sql: &str,
  key: &str,
) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(sql, rusqlite::params![key], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

/// Draw registration numbers from `generate` until one is not yet used in
/// `table`. `None` means every attempt collided.
fn fresh_registration_number(
  conn: &rusqlite::Connection,
  table: &str,
  generate: fn() -> String,
) -> rusqlite::Result<Option<String>> {
  let sql = format!("SELECT 1 FROM {table} WHERE registration_number = ?1");
  for _ in 0..REGISTRATION_ATTEMPTS {
    let candidate = generate();
    if !row_exists(conn, &sql, &candidate)? {
      return Ok(Some(candidate));
    }
  }
  Ok(None)
}

fn load_person(
  conn: &rusqlite::Connection,
  id: &str,
) -> rusqlite::Result<Option<RawPerson>> {
  conn
    .query_row(
      &format!("SELECT {PERSON_COLUMNS} FROM persons WHERE id = ?1"),
      rusqlite::params![id],
      RawPerson::from_row,
    )
    .optional()
}

fn person_ids_for(
  conn: &rusqlite::Connection,
  incident_id: &str,
) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare_cached(
    "SELECT person_id FROM incident_persons WHERE incident_id = ?1 ORDER BY rowid",
  )?;
  stmt
    .query_map(rusqlite::params![incident_id], |row| row.get(0))?
    .collect()
}

fn load_incident(
  conn: &rusqlite::Connection,
  id: &str,
) -> rusqlite::Result<Option<RawIncident>> {
  let raw = conn
    .query_row(
      &format!("SELECT {INCIDENT_COLUMNS} FROM incidents i WHERE i.id = ?1"),
      rusqlite::params![id],
      RawIncident::from_row,
    )
    .optional()?;

  match raw {
    Some(mut raw) => {
      raw.involved_persons = person_ids_for(conn, &raw.id)?;
      Ok(Some(raw))
    }
    None => Ok(None),
  }
}

/// Attach `person_ids` to an incident. Stops at the first id that does not
/// name a person; the caller must then drop (roll back) its transaction.
fn attach_persons(
  conn: &rusqlite::Connection,
  incident_id: &str,
  person_ids: &[String],
) -> rusqlite::Result<Result<(), CoreError>> {
  for person_id in person_ids {
    if !row_exists(conn, "SELECT 1 FROM persons WHERE id = ?1", person_id)? {
      return Ok(Err(CoreError::UnknownPerson(person_id.clone())));
    }
    conn.execute(
      "INSERT OR IGNORE INTO incident_persons (incident_id, person_id) VALUES (?1, ?2)",
      rusqlite::params![incident_id, person_id],
    )?;
  }
  Ok(Ok(()))
}

// ─── IncidentStore impl ──────────────────────────────────────────────────────

impl IncidentStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, username: String, password_hash: String) -> Result<User> {
    let user = User { id: ids::user_id(), username, password_hash };

    let id            = user.id.clone();
    let username      = user.username.clone();
    let password_hash = user.password_hash.clone();

    let outcome: Result<(), CoreError> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if row_exists(&tx, "SELECT 1 FROM users WHERE username = ?1", &username)? {
          return Ok(Err(CoreError::Conflict(format!(
            "username {username:?} is already taken"
          ))));
        }
        tx.execute(
          "INSERT INTO users (id, username, password_hash) VALUES (?1, ?2, ?3)",
          rusqlite::params![id, username, password_hash],
        )?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;
    outcome?;

    tracing::debug!(user_id = %user.id, username = %user.username, "user created");
    Ok(user)
  }

  async fn find_user(&self, username: &str) -> Result<Option<User>> {
    let username = username.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, username, password_hash FROM users WHERE username = ?1",
              rusqlite::params![username],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawUser::into_user))
  }

  // ── Persons ───────────────────────────────────────────────────────────────

  async fn list_persons(&self) -> Result<Vec<Person>> {
    let raws: Vec<RawPerson> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PERSON_COLUMNS} FROM persons ORDER BY name, id"
        ))?;
        let rows = stmt
          .query_map([], RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }

  async fn get_person(&self, id: &str) -> Result<Option<Person>> {
    let id = id.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(load_person(conn, &id)?))
      .await?;
    raw.map(RawPerson::into_person).transpose()
  }

  async fn create_person(&self, input: PersonInput) -> Result<Person> {
    let id = ids::person_id();

    let outcome: Result<RawPerson, CoreError> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(registration_number) =
          fresh_registration_number(&tx, "persons", ids::person_registration_number)?
        else {
          return Ok(Err(CoreError::Conflict(
            "could not allocate a unique person registration number".into(),
          )));
        };
        tx.execute(
          "INSERT INTO persons (
             id, registration_number, name, address, role, phone, email
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id,
            registration_number,
            input.name,
            input.address,
            input.role.as_str(),
            input.phone,
            input.email,
          ],
        )?;
        let stored = load_person(&tx, &id)?;
        tx.commit()?;
        Ok(stored.ok_or_else(|| CoreError::not_found("person", id)))
      })
      .await?;

    let person = outcome?.into_person()?;
    tracing::debug!(
      person_id = %person.id,
      registration_number = %person.registration_number,
      "person created"
    );
    Ok(person)
  }

  async fn update_person(&self, id: &str, input: PersonInput) -> Result<Option<Person>> {
    let id = id.to_owned();

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE persons
             SET name = ?2, address = ?3, role = ?4, phone = ?5, email = ?6
           WHERE id = ?1",
          rusqlite::params![
            id,
            input.name,
            input.address,
            input.role.as_str(),
            input.phone,
            input.email,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let stored = load_person(&tx, &id)?;
        tx.commit()?;
        Ok(stored)
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  async fn delete_person(&self, id: &str) -> Result<bool> {
    let id = id.to_owned();
    let log_id = id.clone();

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM persons WHERE id = ?1", rusqlite::params![id])? > 0)
      })
      .await?;

    if deleted {
      tracing::debug!(person_id = %log_id, "person deleted");
    }
    Ok(deleted)
  }

  // ── Incidents ─────────────────────────────────────────────────────────────

  async fn list_incidents(&self, range: Option<DateRange>) -> Result<Vec<Incident>> {
    let bounds = range.map(|r| (encode_dt(r.start), encode_dt(r.end)));

    let raws: Vec<RawIncident> = self
      .conn
      .call(move |conn| {
        let mut rows = if let Some((start, end)) = bounds {
          let mut stmt = conn.prepare(&format!(
            "SELECT {INCIDENT_COLUMNS} FROM incidents i
             WHERE i.date BETWEEN ?1 AND ?2
             ORDER BY i.date, i.id"
          ))?;
          stmt
            .query_map(rusqlite::params![start, end], RawIncident::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {INCIDENT_COLUMNS} FROM incidents i ORDER BY i.date, i.id"
          ))?;
          stmt
            .query_map([], RawIncident::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        // One pass over the join table instead of a query per incident.
        let mut persons: HashMap<String, Vec<String>> = HashMap::new();
        let mut stmt = conn.prepare(
          "SELECT incident_id, person_id FROM incident_persons ORDER BY rowid",
        )?;
        let pairs = stmt.query_map([], |row| {
          Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for pair in pairs {
          let (incident_id, person_id) = pair?;
          persons.entry(incident_id).or_default().push(person_id);
        }

        for raw in &mut rows {
          raw.involved_persons = persons.remove(&raw.id).unwrap_or_default();
        }
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawIncident::into_incident).collect()
  }

  async fn get_incident(&self, id: &str) -> Result<Option<Incident>> {
    let id = id.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(load_incident(conn, &id)?))
      .await?;
    raw.map(RawIncident::into_incident).transpose()
  }

  async fn create_incident(&self, input: IncidentInput) -> Result<Incident> {
    let id       = ids::incident_id();
    // Truncated to what the column stores so the returned record equals
    // every later read.
    let date_str = encode_dt(Utc::now().trunc_subsecs(6));

    let outcome: Result<RawIncident, CoreError> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(registration_number) = fresh_registration_number(
          &tx,
          "incidents",
          ids::incident_registration_number,
        )?
        else {
          return Ok(Err(CoreError::Conflict(
            "could not allocate a unique incident registration number".into(),
          )));
        };
        tx.execute(
          "INSERT INTO incidents (
             id, registration_number, type, description, location, date, severity
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id,
            registration_number,
            input.kind,
            input.description,
            input.location,
            date_str,
            input.severity.as_str(),
          ],
        )?;
        if let Err(e) = attach_persons(&tx, &id, &input.involved_persons)? {
          return Ok(Err(e));
        }
        let stored = load_incident(&tx, &id)?;
        tx.commit()?;
        Ok(stored.ok_or_else(|| CoreError::not_found("incident", id)))
      })
      .await?;

    let incident = outcome?.into_incident()?;
    tracing::debug!(
      incident_id = %incident.id,
      registration_number = %incident.registration_number,
      persons = incident.involved_persons.len(),
      "incident created"
    );
    Ok(incident)
  }

  async fn update_incident(
    &self,
    id:    &str,
    input: IncidentInput,
  ) -> Result<Option<Incident>> {
    let id = id.to_owned();

    let outcome: Result<Option<RawIncident>, CoreError> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE incidents
             SET type = ?2, description = ?3, location = ?4, severity = ?5
           WHERE id = ?1",
          rusqlite::params![
            id,
            input.kind,
            input.description,
            input.location,
            input.severity.as_str(),
          ],
        )?;
        if changed == 0 {
          return Ok(Ok(None));
        }
        tx.execute(
          "DELETE FROM incident_persons WHERE incident_id = ?1",
          rusqlite::params![id],
        )?;
        if let Err(e) = attach_persons(&tx, &id, &input.involved_persons)? {
          return Ok(Err(e));
        }
        let stored = load_incident(&tx, &id)?;
        tx.commit()?;
        Ok(Ok(stored))
      })
      .await?;

    let incident = outcome?.map(RawIncident::into_incident).transpose()?;
    if let Some(incident) = &incident {
      tracing::debug!(incident_id = %incident.id, "incident updated");
    }
    Ok(incident)
  }

  async fn delete_incident(&self, id: &str) -> Result<bool> {
    let id = id.to_owned();
    let log_id = id.clone();

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM incidents WHERE id = ?1", rusqlite::params![id])? > 0)
      })
      .await?;

    if deleted {
      tracing::debug!(incident_id = %log_id, "incident deleted");
    }
    Ok(deleted)
  }

  async fn incidents_for_person(&self, person_id: &str) -> Result<Option<Vec<Incident>>> {
    let person_id = person_id.to_owned();

    let raws: Option<Vec<RawIncident>> = self
      .conn
      .call(move |conn| {
        if !row_exists(conn, "SELECT 1 FROM persons WHERE id = ?1", &person_id)? {
          return Ok(None);
        }
        let mut stmt = conn.prepare(&format!(
          "SELECT {INCIDENT_COLUMNS}
           FROM incidents i
           JOIN incident_persons ip ON ip.incident_id = i.id
           WHERE ip.person_id = ?1
           ORDER BY i.date, i.id"
        ))?;
        let mut rows = stmt
          .query_map(rusqlite::params![person_id], RawIncident::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        for raw in &mut rows {
          raw.involved_persons = person_ids_for(conn, &raw.id)?;
        }
        Ok(Some(rows))
      })
      .await?;

    raws
      .map(|rows| rows.into_iter().map(RawIncident::into_incident).collect())
      .transpose()
  }
}
