//! The `PolicyStore` trait and the write batch it commits.
//!
//! The trait is implemented by storage backends (e.g.
//! `clause-store-sqlite`). Ingestion and the HTTP layer depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  change::{ChangeSummary, DiffListing, DiffRecord},
  policy::{
    Framework, NewFramework, Policy, PolicyHistory, Revision, RevisionView,
    StoredSection,
  },
  section::SectionMap,
};

// ─── Write batch ─────────────────────────────────────────────────────────────

/// Everything one ingestion writes, applied by
/// [`PolicyStore::commit_revision`] as a single unit.
#[derive(Debug, Clone)]
pub struct RevisionCommit {
  pub framework_id: Uuid,
  pub policy_title: String,
  pub version:      String,
  /// Used only when the revision does not exist yet.
  pub created_at:   DateTime<Utc>,
  /// Upserted by section number; rows not listed are left untouched.
  pub sections:     Vec<StoredSection>,
  /// Appended; earlier diff rows of the revision are kept.
  pub diffs:        Vec<DiffRecord>,
  /// Replaces the revision's stored change summary.
  pub summary:      ChangeSummary,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Clause policy store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait PolicyStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Frameworks ────────────────────────────────────────────────────────

  fn create_framework(
    &self,
    input: NewFramework,
  ) -> impl Future<Output = Result<Framework, Self::Error>> + Send + '_;

  fn list_frameworks(
    &self,
  ) -> impl Future<Output = Result<Vec<Framework>, Self::Error>> + Send + '_;

  /// Returns `None` if not found.
  fn get_framework(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Framework>, Self::Error>> + Send + '_;

  // ── Policies and revisions ────────────────────────────────────────────

  fn list_policies(
    &self,
  ) -> impl Future<Output = Result<Vec<Policy>, Self::Error>> + Send + '_;

  fn find_policy<'a>(
    &'a self,
    framework_id: Uuid,
    title: &'a str,
  ) -> impl Future<Output = Result<Option<Policy>, Self::Error>> + Send + 'a;

  fn find_revision<'a>(
    &'a self,
    policy_id: Uuid,
    version: &'a str,
  ) -> impl Future<Output = Result<Option<Revision>, Self::Error>> + Send + 'a;

  fn get_revision(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Revision>, Self::Error>> + Send + '_;

  /// The most recently created revision of `policy_id` other than
  /// `exclude`, with all of its stored sections (archived ones included) in
  /// stored order.
  fn latest_other_revision(
    &self,
    policy_id: Uuid,
    exclude: Option<Uuid>,
  ) -> impl Future<Output = Result<Option<(Revision, SectionMap)>, Self::Error>>
  + Send
  + '_;

  /// All stored sections of a revision, archived ones included.
  fn revision_sections(
    &self,
    revision_id: Uuid,
  ) -> impl Future<Output = Result<Vec<StoredSection>, Self::Error>> + Send + '_;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Get-or-create the policy and revision, then apply the section upserts,
  /// diff rows and change summary of `commit`. Either everything is applied
  /// or nothing is.
  fn commit_revision(
    &self,
    commit: RevisionCommit,
  ) -> impl Future<Output = Result<Revision, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Diff rows of a revision in insertion order.
  fn list_diffs(
    &self,
    revision_id: Uuid,
  ) -> impl Future<Output = Result<Vec<DiffListing>, Self::Error>> + Send + '_;

  /// Returns `None` if the revision does not exist.
  fn revision_view(
    &self,
    revision_id: Uuid,
  ) -> impl Future<Output = Result<Option<RevisionView>, Self::Error>> + Send + '_;

  /// Returns `None` if the policy does not exist.
  fn policy_history(
    &self,
    policy_id: Uuid,
  ) -> impl Future<Output = Result<Option<PolicyHistory>, Self::Error>> + Send + '_;
}
