//! Field-level validation shared by the person and incident inputs.

use crate::{Error, Result};

/// Trim `value` and reject it if nothing is left.
pub fn required(field: &'static str, value: String) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::validation(field, "must not be empty"));
  }
  if trimmed.len() == value.len() {
    Ok(value)
  } else {
    Ok(trimmed.to_owned())
  }
}

/// A minimal email shape check: one `@` with a non-empty local part and a
/// dotted domain. Deliverability is not our concern.
pub fn email(value: String) -> Result<String> {
  let value = required("email", value)?;
  let valid = value.split_once('@').is_some_and(|(local, domain)| {
    !local.is_empty()
      && !domain.contains('@')
      && domain.contains('.')
      && !domain.starts_with('.')
      && !domain.ends_with('.')
  });
  if valid {
    Ok(value)
  } else {
    Err(Error::validation("email", "not a valid email address"))
  }
}
