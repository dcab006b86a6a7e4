//! Incidents: recorded events and the persons involved in them.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, validate};

// ─── Severity ────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Low,
  Medium,
  High,
}

impl Severity {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Low => "low",
      Self::Medium => "medium",
      Self::High => "high",
    }
  }
}

impl FromStr for Severity {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "low" => Ok(Self::Low),
      "medium" => Ok(Self::Medium),
      "high" => Ok(Self::High),
      other => Err(Error::InvalidSeverity(other.to_owned())),
    }
  }
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Incident ────────────────────────────────────────────────────────────────

/// A stored incident together with the ids of the persons involved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
  pub id:                  String,
  pub registration_number: String,
  /// Free-text category, e.g. "theft" or "traffic accident".
  #[serde(rename = "type")]
  pub kind:                String,
  pub description:         String,
  pub location:            String,
  /// Server-assigned creation time; never changes afterwards.
  pub date:                DateTime<Utc>,
  pub severity:            Severity,
  #[serde(rename = "involvedPersons")]
  pub involved_persons:    Vec<String>,
}

/// The unauthenticated view of an incident. Carries nothing investigative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicIncident {
  pub registration_number: String,
  pub location:            String,
}

impl From<&Incident> for PublicIncident {
  fn from(incident: &Incident) -> Self {
    Self {
      registration_number: incident.registration_number.clone(),
      location:            incident.location.clone(),
    }
  }
}

// ─── IncidentInput ───────────────────────────────────────────────────────────

/// Validated input to [`crate::store::IncidentStore::create_incident`] and
/// [`crate::store::IncidentStore::update_incident`].
///
/// `date`, `id` and `registration_number` are never accepted from callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentInput {
  pub kind:             String,
  pub description:      String,
  pub location:         String,
  pub severity:         Severity,
  /// Person ids to attach, deduplicated with first-occurrence order kept.
  pub involved_persons: Vec<String>,
}

impl IncidentInput {
  pub fn parse(
    kind: String,
    description: String,
    location: String,
    severity: &str,
    involved_persons: Vec<String>,
  ) -> Result<Self> {
    let mut persons: Vec<String> = Vec::with_capacity(involved_persons.len());
    for id in involved_persons {
      let id = validate::required("involvedPersons", id)?;
      if !persons.contains(&id) {
        persons.push(id);
      }
    }

    Ok(Self {
      kind:             validate::required("type", kind)?,
      description:      validate::required("description", description)?,
      location:         validate::required("location", location)?,
      severity:         severity.trim().parse()?,
      involved_persons: persons,
    })
  }
}

// ─── DateRange ───────────────────────────────────────────────────────────────

/// An inclusive `[start, end]` window over incident dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
  pub start: DateTime<Utc>,
  pub end:   DateTime<Utc>,
}

impl DateRange {
  pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
    if start > end {
      return Err(Error::InvalidDateRange(format!(
        "start {start} is after end {end}"
      )));
    }
    Ok(Self { start, end })
  }

  /// Parse query-string bounds.
  ///
  /// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS[.fff]` (taken as
  /// UTC), and bare `YYYY-MM-DD` dates. A bare end date covers that whole day.
  ///
  /// Values arrive already percent-decoded, so a `+hh:mm` offset sent in a
  /// query string must be encoded as `%2B`; a raw `+` decodes to a space and
  /// the bound is rejected.
  pub fn parse(start: &str, end: &str) -> Result<Self> {
    let start = parse_bound(start, NaiveTime::MIN)?;
    let end = parse_bound(end, end_of_day())?;
    Self::new(start, end)
  }

  pub fn contains(&self, at: DateTime<Utc>) -> bool {
    self.start <= at && at <= self.end
  }
}

fn end_of_day() -> NaiveTime {
  NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(NaiveTime::MIN)
}

fn parse_bound(raw: &str, date_only_time: NaiveTime) -> Result<DateTime<Utc>> {
  let raw = raw.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Ok(dt.with_timezone(&Utc));
  }
  for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
      return Ok(naive.and_utc());
    }
  }
  if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
    return Ok(date.and_time(date_only_time).and_utc());
  }
  Err(Error::InvalidDateRange(format!("cannot parse date {raw:?}")))
}
