//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed microsecond
//! precision so that they sort lexically. Change summaries and diff details
//! are stored as compact JSON. UUIDs are stored as hyphenated lowercase
//! strings.

use chrono::{DateTime, SecondsFormat, Utc};
use clause_core::{
  change::{ChangeDetails, ChangeSummary},
  policy::{Framework, Policy, Revision, StoredSection},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_summary(summary: &ChangeSummary) -> Result<String> {
  Ok(serde_json::to_string(summary)?)
}

pub fn decode_summary(s: &str) -> Result<ChangeSummary> { Ok(serde_json::from_str(s)?) }

pub fn encode_details(details: &ChangeDetails) -> Result<String> {
  Ok(serde_json::to_string(details)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `frameworks` row.
pub struct RawFramework {
  pub framework_id: String,
  pub name:         String,
  pub description:  String,
}

impl RawFramework {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      framework_id: row.get(0)?,
      name:         row.get(1)?,
      description:  row.get(2)?,
    })
  }

  pub fn into_framework(self) -> Result<Framework> {
    Ok(Framework {
      framework_id: decode_uuid(&self.framework_id)?,
      name:         self.name,
      description:  self.description,
    })
  }
}

/// Raw strings read directly from a `policies` row.
pub struct RawPolicy {
  pub policy_id:    String,
  pub framework_id: String,
  pub title:        String,
}

impl RawPolicy {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      policy_id:    row.get(0)?,
      framework_id: row.get(1)?,
      title:        row.get(2)?,
    })
  }

  pub fn into_policy(self) -> Result<Policy> {
    Ok(Policy {
      policy_id:    decode_uuid(&self.policy_id)?,
      framework_id: decode_uuid(&self.framework_id)?,
      title:        self.title,
    })
  }
}

/// Columns selected for every revision read, in `RawRevision::from_row` order.
pub const REVISION_COLUMNS: &str =
  "revision_id, policy_id, version, created_at, change_summary";

/// Raw strings read directly from a `revisions` row.
pub struct RawRevision {
  pub revision_id:    String,
  pub policy_id:      String,
  pub version:        String,
  pub created_at:     String,
  pub change_summary: Option<String>,
}

impl RawRevision {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      revision_id:    row.get(0)?,
      policy_id:      row.get(1)?,
      version:        row.get(2)?,
      created_at:     row.get(3)?,
      change_summary: row.get(4)?,
    })
  }

  pub fn into_revision(self) -> Result<Revision> {
    Ok(Revision {
      revision_id:    decode_uuid(&self.revision_id)?,
      policy_id:      decode_uuid(&self.policy_id)?,
      version:        self.version,
      created_at:     decode_dt(&self.created_at)?,
      change_summary: self
        .change_summary
        .as_deref()
        .map(decode_summary)
        .transpose()?,
    })
  }
}

pub fn section_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredSection> {
  Ok(StoredSection {
    section_number: row.get(0)?,
    content:        row.get(1)?,
    archived:       row.get(2)?,
  })
}
