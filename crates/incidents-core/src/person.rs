//! Persons involved in one or more incidents.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, validate};

/// The part a person played in an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Suspect,
  Witness,
  Victim,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Suspect => "suspect",
      Self::Witness => "witness",
      Self::Victim => "victim",
    }
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "suspect" => Ok(Self::Suspect),
      "witness" => Ok(Self::Witness),
      "victim" => Ok(Self::Victim),
      other => Err(Error::InvalidRole(other.to_owned())),
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A stored person. `id` and `registration_number` never change once
/// assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub id:                  String,
  pub registration_number: String,
  pub name:                String,
  pub address:             String,
  pub role:                Role,
  pub phone:               String,
  pub email:               String,
}

/// Validated input to [`crate::store::IncidentStore::create_person`] and
/// [`crate::store::IncidentStore::update_person`]: every mutable field of a
/// person, replaced wholesale on update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonInput {
  pub name:    String,
  pub address: String,
  pub role:    Role,
  pub phone:   String,
  pub email:   String,
}

impl PersonInput {
  /// Validate raw field values. The role is parsed from its wire string so an
  /// unknown value surfaces as [`Error::InvalidRole`].
  pub fn parse(
    name: String,
    address: String,
    role: &str,
    phone: String,
    email: String,
  ) -> Result<Self> {
    Ok(Self {
      name:    validate::required("name", name)?,
      address: validate::required("address", address)?,
      role:    role.trim().parse()?,
      phone:   validate::required("phone", phone)?,
      email:   validate::email(email)?,
    })
  }

  /// Build the stored record for a freshly created person.
  pub fn into_person(self, id: String, registration_number: String) -> Person {
    Person {
      id,
      registration_number,
      name: self.name,
      address: self.address,
      role: self.role,
      phone: self.phone,
      email: self.email,
    }
  }
}
