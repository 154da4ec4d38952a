//! Revision reconciliation: incoming sections → changes, removals and the
//! stored-section updates needed to record them.
//!
//! Two baselines are involved. `prior` is the latest *other* revision of the
//! policy and decides whether a section is added or modified. `existing` is
//! what is already stored for the revision being written (non-empty only
//! when a version label is ingested again) and decides which stored rows
//! change and which get archived.

use std::collections::{HashMap, HashSet};

use crate::{
  change::{ChangeEntry, ChangeType, Deprecation},
  policy::StoredSection,
  section::{SectionMap, compare_labels},
  udiff::{ORIGINAL_LABEL, unified_diff},
};

/// The revision a new ingestion is compared against.
#[derive(Debug, Clone, Copy)]
pub struct Prior<'a> {
  pub version:  &'a str,
  pub sections: &'a SectionMap,
}

/// The outcome of [`reconcile`].
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
  /// Added and modified sections, in `current` order.
  pub changes:      Vec<ChangeEntry>,
  /// Removed sections, in section-number order.
  pub deprecations: Vec<Deprecation>,
  /// The full stored-section set for the revision after this ingestion:
  /// every section of `current` (live), then every other previously stored
  /// section (archived).
  pub sections:     Vec<StoredSection>,
}

/// Classify every section of `current` against `prior` and `existing`.
///
/// - A section whose stored row already holds the same (trimmed) content is
///   left alone apart from being un-archived, and yields no change.
/// - Otherwise the row is rewritten and the section is `added` when `prior`
///   lacks it, `modified` when `prior` differs, and also `modified` when
///   `prior` matches but a differing stored row was overwritten.
/// - Stored rows missing from `current` are archived. Sections missing from
///   `current` but present in `prior` or in a stored row are deprecated.
///
/// With no prior revision every new section is `added`.
pub fn reconcile(
  version: &str,
  current: &SectionMap,
  prior: Option<Prior<'_>>,
  existing: &[StoredSection],
) -> Reconciliation {
  let empty = SectionMap::new();
  let (prior_sections, prior_version) = match prior {
    Some(p) => (p.sections, Some(p.version)),
    None => (&empty, None),
  };
  let stored: HashMap<&str, &StoredSection> = existing
    .iter()
    .map(|s| (s.section_number.as_str(), s))
    .collect();

  let mut out = Reconciliation::default();

  for (label, content) in current.iter() {
    let stored_row = stored.get(label).copied();

    if let Some(row) = stored_row
      && row.content.trim() == content.trim()
    {
      out.sections.push(StoredSection { archived: false, ..row.clone() });
      continue;
    }
    out.sections.push(StoredSection::current(label, content));

    let old = prior_sections.get(label);
    let change_type = match old {
      None => ChangeType::Added,
      Some(old) if old.trim() != content.trim() => ChangeType::Modified,
      // Same as prior, but it replaced a different stored body.
      Some(_) if stored_row.is_some() => ChangeType::Modified,
      Some(_) => continue,
    };

    let old = old.unwrap_or_default();
    let old_label = match prior_version {
      Some(v) => format!("{v}:{label}"),
      None => ORIGINAL_LABEL.to_owned(),
    };
    let diff_text = unified_diff(old, content, &old_label, &format!("{version}:{label}"));

    out.changes.push(ChangeEntry {
      section_number: label.to_owned(),
      change_type,
      old_content: old.to_owned(),
      new_content: content.to_owned(),
      diff_text,
    });
  }

  out.sections.extend(
    existing
      .iter()
      .filter(|s| !current.contains(&s.section_number))
      .map(|s| StoredSection { archived: true, ..s.clone() }),
  );

  let mut removed: Vec<&str> = prior_sections
    .labels()
    .chain(existing.iter().map(|s| s.section_number.as_str()))
    .filter(|label| !current.contains(label))
    .collect::<HashSet<_>>()
    .into_iter()
    .collect();
  removed.sort_by(|a, b| compare_labels(a, b));

  out.deprecations = removed
    .into_iter()
    .map(|label| Deprecation {
      section_number:     label.to_owned(),
      old_content:        prior_sections
        .get(label)
        .or_else(|| stored.get(label).map(|s| s.content.as_str()))
        .unwrap_or_default()
        .to_owned(),
      removed_in_version: version.to_owned(),
    })
    .collect();

  out
}

// ─── Tests ────────────────────────────────────────────────────────────────────
