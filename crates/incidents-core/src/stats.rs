//! Aggregate statistics over a set of incidents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::incident::{Incident, Severity};

/// Per-severity counts. A struct rather than a map so the three keys are
/// always present, zero or not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
  pub low:    u64,
  pub medium: u64,
  pub high:   u64,
}

impl SeverityCounts {
  fn bump(&mut self, severity: Severity) {
    match severity {
      Severity::Low => self.low += 1,
      Severity::Medium => self.medium += 1,
      Severity::High => self.high += 1,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCount {
  /// Calendar month in `YYYY-MM` form (UTC).
  pub month: String,
  pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
  pub total_incidents: u64,
  /// Occurrences per free-text incident type, keyed by the exact type string.
  pub by_type:         BTreeMap<String, u64>,
  pub by_severity:     SeverityCounts,
  /// Chronological, only months with at least one incident.
  pub by_month:        Vec<MonthCount>,
}

impl Statistics {
  pub fn from_incidents<'a>(
    incidents: impl IntoIterator<Item = &'a Incident>,
  ) -> Self {
    let mut stats = Self::default();
    let mut months: BTreeMap<String, u64> = BTreeMap::new();

    for incident in incidents {
      stats.total_incidents += 1;
      *stats.by_type.entry(incident.kind.clone()).or_default() += 1;
      stats.by_severity.bump(incident.severity);
      *months
        .entry(incident.date.format("%Y-%m").to_string())
        .or_default() += 1;
    }

    stats.by_month = months
      .into_iter()
      .map(|(month, count)| MonthCount { month, count })
      .collect();
    stats
  }
}
