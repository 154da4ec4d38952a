//! Change records: the audit trail produced by every ingestion.
//!
//! [`ChangeSummary::build`] aggregates the per-section output of
//! [`crate::reconcile::reconcile`] into the record stored with a revision.
//! [`DiffRecord`]s are the per-section rows persisted alongside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Per-section changes ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
  Added,
  Modified,
  Removed,
}

/// A section that was added or modified relative to the prior revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
  pub section_number: String,
  pub change_type:    ChangeType,
  /// The prior revision's body; empty for added sections.
  pub old_content:    String,
  pub new_content:    String,
  /// Unified diff of `old_content` → `new_content`. Empty when a section is
  /// restored to its prior body, which still counts as `modified`.
  pub diff_text:      String,
}

/// A section present before this ingestion but absent from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deprecation {
  pub section_number:     String,
  pub old_content:        String,
  pub removed_in_version: String,
}

// ─── Summary ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStats {
  pub sections_added:    usize,
  pub sections_modified: usize,
  pub sections_removed:  usize,
  /// Sections in the new revision; removed sections are not counted.
  pub total_sections:    usize,
}

/// Who and when: the identity fields copied into a [`ChangeSummary`].
#[derive(Debug, Clone)]
pub struct RevisionIdentity {
  pub version_label:  String,
  pub policy_title:   String,
  pub framework_name: String,
  pub created_at:     DateTime<Utc>,
}

/// The audit record of one ingestion. Never modified once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
  pub version_label:  String,
  pub policy_title:   String,
  pub framework_name: String,
  pub created_at:     DateTime<Utc>,
  pub changes:        Vec<ChangeEntry>,
  pub deprecations:   Vec<Deprecation>,
  pub stats:          ChangeStats,
}

impl ChangeSummary {
  pub fn build(
    identity: RevisionIdentity,
    changes: Vec<ChangeEntry>,
    deprecations: Vec<Deprecation>,
    total_sections: usize,
  ) -> Self {
    let count = |ty: ChangeType| changes.iter().filter(|c| c.change_type == ty).count();
    let stats = ChangeStats {
      sections_added: count(ChangeType::Added),
      sections_modified: count(ChangeType::Modified),
      sections_removed: deprecations.len(),
      total_sections,
    };

    Self {
      version_label: identity.version_label,
      policy_title: identity.policy_title,
      framework_name: identity.framework_name,
      created_at: identity.created_at,
      changes,
      deprecations,
      stats,
    }
  }

  pub fn is_empty(&self) -> bool { self.changes.is_empty() && self.deprecations.is_empty() }
}

// ─── Persisted diff rows ─────────────────────────────────────────────────────

/// Structured detail stored with each [`DiffRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDetails {
  pub change_type: ChangeType,
  pub old_content: String,
  pub new_content: String,
  pub timestamp:   DateTime<Utc>,
  pub diff:        String,
}

/// One persisted diff row for a section touched by an ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRecord {
  pub section_number: String,
  pub diff_text:      String,
  pub change_details: ChangeDetails,
}

impl DiffRecord {
  pub fn from_change(entry: &ChangeEntry, timestamp: DateTime<Utc>) -> Self {
    Self {
      section_number: entry.section_number.clone(),
      diff_text:      entry.diff_text.clone(),
      change_details: ChangeDetails {
        change_type: entry.change_type,
        old_content: entry.old_content.clone(),
        new_content: entry.new_content.clone(),
        timestamp,
        diff: entry.diff_text.clone(),
      },
    }
  }

  pub fn from_deprecation(dep: &Deprecation, timestamp: DateTime<Utc>) -> Self {
    let section = &dep.section_number;
    Self {
      section_number: section.clone(),
      diff_text:      format!("Section {section} was removed"),
      change_details: ChangeDetails {
        change_type: ChangeType::Removed,
        old_content: dep.old_content.clone(),
        new_content: String::new(),
        timestamp,
        diff: format!(
          "Section {section} was removed in version {}",
          dep.removed_in_version
        ),
      },
    }
  }
}

/// The `(section_number, diff_text)` projection returned by diff listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffListing {
  pub section_number: String,
  pub diff_text:      String,
}

// ─── Tests ────────────────────────────────────────────────────────────────────
