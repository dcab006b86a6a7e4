//! Identifier and registration-number generation.
//!
//! Internal identifiers are `<prefix>-<uuid v4>`. Registration numbers are the
//! short human-facing codes: a two-letter prefix followed by six uppercase hex
//! digits. Registration numbers are random, so uniqueness is ultimately
//! enforced by the store, which regenerates on collision.

use uuid::Uuid;

pub const USER_ID_PREFIX: &str = "user";
pub const PERSON_ID_PREFIX: &str = "person";
pub const INCIDENT_ID_PREFIX: &str = "inc";

pub const PERSON_REGISTRATION_PREFIX: &str = "PR";
pub const INCIDENT_REGISTRATION_PREFIX: &str = "RN";

/// Number of hex digits after the registration prefix.
pub const REGISTRATION_DIGITS: usize = 6;

pub fn user_id() -> String { prefixed_id(USER_ID_PREFIX) }

pub fn person_id() -> String { prefixed_id(PERSON_ID_PREFIX) }

pub fn incident_id() -> String { prefixed_id(INCIDENT_ID_PREFIX) }

pub fn person_registration_number() -> String {
  registration_number(PERSON_REGISTRATION_PREFIX)
}

pub fn incident_registration_number() -> String {
  registration_number(INCIDENT_REGISTRATION_PREFIX)
}

fn prefixed_id(prefix: &str) -> String {
  format!("{prefix}-{}", Uuid::new_v4().hyphenated())
}

fn registration_number(prefix: &str) -> String {
  let hex = Uuid::new_v4().simple().to_string();
  format!("{prefix}{}", hex[..REGISTRATION_DIGITS].to_ascii_uppercase())
}

/// Whether `s` has the shape `<prefix><6 uppercase hex digits>`.
pub fn is_registration_number(prefix: &str, s: &str) -> bool {
  s.strip_prefix(prefix).is_some_and(|digits| {
    digits.len() == REGISTRATION_DIGITS
      && digits
        .chars()
        .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
  })
}
