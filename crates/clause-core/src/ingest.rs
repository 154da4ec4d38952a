//! Ingestion: one submitted revision → parsed, reconciled and committed.
//!
//! The store is consulted for the framework, the revision being written (if
//! its version label was ingested before) and the latest other revision of
//! the policy. Everything derived from those reads is committed in a single
//! [`PolicyStore::commit_revision`] call, so a failed ingestion leaves
//! nothing behind.
//!
//! Callers must not run two ingestions for the same policy concurrently:
//! both would read the same prior revision and race on archival flags.

use chrono::{SubsecRound as _, Utc};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error, Result,
  change::{ChangeSummary, DiffRecord, RevisionIdentity},
  policy::Revision,
  reconcile::{Prior, reconcile},
  section::{SectionMap, parse},
  source::{TextExtractor, split_lines},
  store::{PolicyStore, RevisionCommit},
};

// ─── Input ───────────────────────────────────────────────────────────────────

/// One section of a structured (editor) submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SectionInput {
  pub section_number: String,
  pub content:        String,
}

/// The body of a revision, in any of the accepted forms.
#[derive(Debug, Clone)]
pub enum Content {
  /// Raw text; section numbers on their own lines.
  Text(String),
  /// An uploaded document, run through a [`TextExtractor`].
  Document(Vec<u8>),
  /// Sections supplied directly, bypassing the parser.
  Sections(Vec<SectionInput>),
}

#[derive(Debug, Clone)]
pub struct Submission {
  pub framework_id: Uuid,
  pub policy_title: String,
  pub version:      String,
  pub content:      Content,
}

/// The committed revision and the change record of this ingestion.
#[derive(Debug, Clone)]
pub struct Ingested {
  pub revision: Revision,
  pub summary:  ChangeSummary,
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

/// Turn submitted content into a section map.
///
/// Text with no lines is rejected with [`Error::EmptyInput`]; text with lines
/// but no section numbers yields an empty map.
pub fn sections_from(content: Content, extractor: &dyn TextExtractor) -> Result<SectionMap> {
  match content {
    Content::Text(text) => parse_text(&text),
    Content::Document(bytes) => {
      let text = extractor.extract(&bytes).map_err(Error::UpstreamFetch)?;
      parse_text(&text)
    }
    Content::Sections(sections) => {
      if sections.is_empty() {
        return Err(Error::EmptyInput);
      }
      Ok(
        sections
          .iter()
          .map(|s| (s.section_number.trim(), s.content.trim()))
          .filter(|(label, _)| !label.is_empty())
          .collect(),
      )
    }
  }
}

fn parse_text(text: &str) -> Result<SectionMap> {
  let lines = split_lines(text);
  if lines.is_empty() {
    return Err(Error::EmptyInput);
  }
  Ok(parse(lines))
}

/// Ingest `submission` as a revision of its policy.
pub async fn ingest<S: PolicyStore>(
  store: &S,
  extractor: &dyn TextExtractor,
  submission: Submission,
) -> Result<Ingested> {
  let Submission { framework_id, policy_title, version, content } = submission;

  if policy_title.trim().is_empty() {
    return Err(Error::MissingRequiredField("policy_title"));
  }
  if version.trim().is_empty() {
    return Err(Error::MissingRequiredField("version"));
  }

  let current = sections_from(content, extractor)?;
  debug!(policy = %policy_title, %version, sections = current.len(), "parsed submission");

  let persist = |e: S::Error| Error::persistence(&policy_title, &version, e);

  let framework = store
    .get_framework(framework_id)
    .await
    .map_err(persist)?
    .ok_or(Error::FrameworkNotFound(framework_id))?;

  let policy = store
    .find_policy(framework_id, &policy_title)
    .await
    .map_err(persist)?;

  let (existing, prior) = match &policy {
    Some(p) => {
      let existing = store.find_revision(p.policy_id, &version).await.map_err(persist)?;
      let prior = store
        .latest_other_revision(p.policy_id, existing.as_ref().map(|r| r.revision_id))
        .await
        .map_err(persist)?;
      (existing, prior)
    }
    None => (None, None),
  };

  let stored = match &existing {
    Some(r) => store.revision_sections(r.revision_id).await.map_err(persist)?,
    None => Vec::new(),
  };

  let outcome = reconcile(
    &version,
    &current,
    prior
      .as_ref()
      .map(|(rev, sections)| Prior { version: &rev.version, sections }),
    &stored,
  );

  // Stores keep microseconds; truncate so the summary matches the row.
  let created_at = existing
    .as_ref()
    .map_or_else(|| Utc::now().trunc_subsecs(6), |r| r.created_at);

  let diffs: Vec<DiffRecord> = outcome
    .changes
    .iter()
    .map(|c| DiffRecord::from_change(c, created_at))
    .chain(
      outcome
        .deprecations
        .iter()
        .map(|d| DiffRecord::from_deprecation(d, created_at)),
    )
    .collect();

  let summary = ChangeSummary::build(
    RevisionIdentity {
      version_label: version.clone(),
      policy_title: policy_title.clone(),
      framework_name: framework.name,
      created_at,
    },
    outcome.changes,
    outcome.deprecations,
    current.len(),
  );

  let revision = store
    .commit_revision(RevisionCommit {
      framework_id,
      policy_title: policy_title.clone(),
      version: version.clone(),
      created_at,
      sections: outcome.sections,
      diffs,
      summary: summary.clone(),
    })
    .await
    .map_err(persist)?;

  info!(
    policy = %policy_title,
    %version,
    revision_id = %revision.revision_id,
    added = summary.stats.sections_added,
    modified = summary.stats.sections_modified,
    removed = summary.stats.sections_removed,
    total = summary.stats.total_sections,
    "ingested revision"
  );

  Ok(Ingested { revision, summary })
}

// ─── Tests ────────────────────────────────────────────────────────────────────
