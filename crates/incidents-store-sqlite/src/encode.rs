//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`
//! suffix) so that lexicographic order in SQL equals chronological order.

use chrono::{DateTime, SecondsFormat, Utc};
use incidents_core::{
  incident::{Incident, Severity},
  person::{Person, Role},
  user::User,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_role(s: &str) -> Result<Role> {
  s.parse().map_err(|_| Error::Corrupt { column: "role", value: s.to_owned() })
}

pub fn decode_severity(s: &str) -> Result<Severity> {
  s.parse()
    .map_err(|_| Error::Corrupt { column: "severity", value: s.to_owned() })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub id:            String,
  pub username:      String,
  pub password_hash: String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      username:      row.get(1)?,
      password_hash: row.get(2)?,
    })
  }

  pub fn into_user(self) -> User {
    User { id: self.id, username: self.username, password_hash: self.password_hash }
  }
}

/// Raw strings read directly from a `persons` row.
pub struct RawPerson {
  pub id:                  String,
  pub registration_number: String,
  pub name:                String,
  pub address:             String,
  pub role:                String,
  pub phone:               String,
  pub email:               String,
}

impl RawPerson {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      registration_number: row.get(1)?,
      name:                row.get(2)?,
      address:             row.get(3)?,
      role:                row.get(4)?,
      phone:               row.get(5)?,
      email:               row.get(6)?,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      role:                decode_role(&self.role)?,
      id:                  self.id,
      registration_number: self.registration_number,
      name:                self.name,
      address:             self.address,
      phone:               self.phone,
      email:               self.email,
    })
  }
}

/// Raw strings read from an `incidents` row, plus the person ids gathered
/// from `incident_persons`.
pub struct RawIncident {
  pub id:                  String,
  pub registration_number: String,
  pub kind:                String,
  pub description:         String,
  pub location:            String,
  pub date:                String,
  pub severity:            String,
  pub involved_persons:    Vec<String>,
}

impl RawIncident {
  /// Read the incident columns; `involved_persons` starts empty.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      registration_number: row.get(1)?,
      kind:                row.get(2)?,
      description:         row.get(3)?,
      location:            row.get(4)?,
      date:                row.get(5)?,
      severity:            row.get(6)?,
      involved_persons:    Vec::new(),
    })
  }

  pub fn into_incident(self) -> Result<Incident> {
    Ok(Incident {
      date:                decode_dt(&self.date)?,
      severity:            decode_severity(&self.severity)?,
      id:                  self.id,
      registration_number: self.registration_number,
      kind:                self.kind,
      description:         self.description,
      location:            self.location,
      involved_persons:    self.involved_persons,
    })
  }
}
