//! Frameworks, policies, revisions and their stored sections.
//!
//! A framework (e.g. "ISO 27001") groups policies. A policy is identified by
//! its title within a framework and accumulates revisions, each labelled by a
//! free-form version string. Revisions are ordered by creation time, never by
//! their labels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::change::ChangeSummary;

// ─── Framework ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Framework {
  pub framework_id: Uuid,
  pub name:         String,
  pub description:  String,
}

/// Input to [`crate::store::PolicyStore::create_framework`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewFramework {
  pub name:        String,
  #[serde(default)]
  pub description: String,
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// A policy document; unique per `(framework_id, title)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
  pub policy_id:    Uuid,
  pub framework_id: Uuid,
  pub title:        String,
}

// ─── Revision ────────────────────────────────────────────────────────────────

/// One versioned snapshot of a policy; unique per `(policy_id, version)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Revision {
  pub revision_id:    Uuid,
  pub policy_id:      Uuid,
  pub version:        String,
  /// Set when the revision is first ingested; re-ingesting the same version
  /// label keeps it.
  pub created_at:     DateTime<Utc>,
  /// The audit record of the most recent ingestion into this revision.
  pub change_summary: Option<ChangeSummary>,
}

/// A section as persisted for a revision.
///
/// Sections dropped by a later ingestion of the same revision are kept with
/// `archived = true` rather than deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSection {
  pub section_number: String,
  pub content:        String,
  pub archived:       bool,
}

impl StoredSection {
  pub fn current(section_number: &str, content: &str) -> Self {
    Self {
      section_number: section_number.to_owned(),
      content:        content.to_owned(),
      archived:       false,
    }
  }
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// A revision together with its live (non-archived) sections, in section
/// number order. Used to pre-populate an editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionView {
  pub revision_id:  Uuid,
  pub version:      String,
  pub policy_id:    Uuid,
  pub policy_title: String,
  pub framework_id: Uuid,
  pub sections:     Vec<StoredSection>,
}

/// One line of a policy's change history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
  pub revision_id: Uuid,
  pub version:     String,
  pub created_at:  DateTime<Utc>,
  pub changes:     Option<ChangeSummary>,
}

/// All revisions of a policy, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyHistory {
  pub policy:  String,
  pub history: Vec<HistoryEntry>,
}
