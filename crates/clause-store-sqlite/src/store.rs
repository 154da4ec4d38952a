//! [`SqliteStore`] — the SQLite implementation of [`PolicyStore`].

use std::path::Path;

use clause_core::{
  change::DiffListing,
  policy::{
    Framework, HistoryEntry, NewFramework, Policy, PolicyHistory, Revision,
    RevisionView, StoredSection,
  },
  section::{SectionMap, compare_labels},
  store::{PolicyStore, RevisionCommit},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    REVISION_COLUMNS, RawFramework, RawPolicy, RawRevision, decode_uuid, encode_details,
    encode_dt, encode_summary, encode_uuid, section_from_row,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Clause policy store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Stored sections of a revision in insertion order.
fn query_sections(
  conn: &rusqlite::Connection,
  revision_id: &str,
  live_only: bool,
) -> rusqlite::Result<Vec<StoredSection>> {
  let sql = if live_only {
    "SELECT section_number, content, archived FROM sections
     WHERE revision_id = ?1 AND archived = 0 ORDER BY rowid"
  } else {
    "SELECT section_number, content, archived FROM sections
     WHERE revision_id = ?1 ORDER BY rowid"
  };
  let mut stmt = conn.prepare(sql)?;
  let rows = stmt
    .query_map(rusqlite::params![revision_id], section_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── PolicyStore impl ────────────────────────────────────────────────────────

impl PolicyStore for SqliteStore {
  type Error = Error;

  // ── Frameworks ────────────────────────────────────────────────────────────

  async fn create_framework(&self, input: NewFramework) -> Result<Framework> {
    let framework = Framework {
      framework_id: Uuid::new_v4(),
      name:         input.name,
      description:  input.description,
    };

    let id_str      = encode_uuid(framework.framework_id);
    let name        = framework.name.clone();
    let description = framework.description.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO frameworks (framework_id, name, description) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name, description],
        )?;
        Ok(())
      })
      .await?;

    Ok(framework)
  }

  async fn list_frameworks(&self) -> Result<Vec<Framework>> {
    let raws: Vec<RawFramework> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT framework_id, name, description FROM frameworks ORDER BY name, rowid",
        )?;
        let rows = stmt
          .query_map([], RawFramework::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFramework::into_framework).collect()
  }

  async fn get_framework(&self, id: Uuid) -> Result<Option<Framework>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawFramework> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT framework_id, name, description FROM frameworks WHERE framework_id = ?1",
            rusqlite::params![id_str],
            RawFramework::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawFramework::into_framework).transpose()
  }

  // ── Policies and revisions ────────────────────────────────────────────────

  async fn list_policies(&self) -> Result<Vec<Policy>> {
    let raws: Vec<RawPolicy> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare("SELECT policy_id, framework_id, title FROM policies ORDER BY title, rowid")?;
        let rows = stmt
          .query_map([], RawPolicy::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPolicy::into_policy).collect()
  }

  async fn find_policy(&self, framework_id: Uuid, title: &str) -> Result<Option<Policy>> {
    let framework_str = encode_uuid(framework_id);
    let title         = title.to_owned();

    let raw: Option<RawPolicy> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT policy_id, framework_id, title FROM policies
             WHERE framework_id = ?1 AND title = ?2",
            rusqlite::params![framework_str, title],
            RawPolicy::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPolicy::into_policy).transpose()
  }

  async fn find_revision(&self, policy_id: Uuid, version: &str) -> Result<Option<Revision>> {
    let policy_str = encode_uuid(policy_id);
    let version    = version.to_owned();

    let raw: Option<RawRevision> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {REVISION_COLUMNS} FROM revisions WHERE policy_id = ?1 AND version = ?2"
            ),
            rusqlite::params![policy_str, version],
            RawRevision::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawRevision::into_revision).transpose()
  }

  async fn get_revision(&self, id: Uuid) -> Result<Option<Revision>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawRevision> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {REVISION_COLUMNS} FROM revisions WHERE revision_id = ?1"),
            rusqlite::params![id_str],
            RawRevision::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawRevision::into_revision).transpose()
  }

  async fn latest_other_revision(
    &self,
    policy_id: Uuid,
    exclude:   Option<Uuid>,
  ) -> Result<Option<(Revision, SectionMap)>> {
    let policy_str  = encode_uuid(policy_id);
    let exclude_str = exclude.map(encode_uuid);

    let found: Option<(RawRevision, Vec<StoredSection>)> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!(
              "SELECT {REVISION_COLUMNS} FROM revisions
               WHERE policy_id = ?1 AND (?2 IS NULL OR revision_id != ?2)
               ORDER BY created_at DESC, rowid DESC
               LIMIT 1"
            ),
            rusqlite::params![policy_str, exclude_str],
            RawRevision::from_row,
          )
          .optional()?;

        let Some(raw) = raw else { return Ok(None) };
        let sections = query_sections(conn, &raw.revision_id, false)?;
        Ok(Some((raw, sections)))
      })
      .await?;

    let Some((raw, sections)) = found else { return Ok(None) };
    let map = sections
      .into_iter()
      .map(|s| (s.section_number, s.content))
      .collect();
    Ok(Some((raw.into_revision()?, map)))
  }

  async fn revision_sections(&self, revision_id: Uuid) -> Result<Vec<StoredSection>> {
    let id_str = encode_uuid(revision_id);

    Ok(
      self
        .conn
        .call(move |conn| Ok(query_sections(conn, &id_str, false)?))
        .await?,
    )
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn commit_revision(&self, commit: RevisionCommit) -> Result<Revision> {
    let framework_id  = commit.framework_id;
    let framework_str = encode_uuid(framework_id);
    let created_str   = encode_dt(commit.created_at);
    let summary_json  = encode_summary(&commit.summary)?;
    let diff_rows     = commit
      .diffs
      .iter()
      .map(|d| {
        Ok((
          encode_uuid(Uuid::new_v4()),
          d.section_number.clone(),
          d.diff_text.clone(),
          encode_details(&d.change_details)?,
        ))
      })
      .collect::<Result<Vec<_>>>()?;
    let RevisionCommit { policy_title, version, sections, .. } = commit;

    let raw: Option<RawRevision> = self
      .conn
      .call(move |conn| {
        // Dropping `tx` without committing rolls everything back.
        let tx = conn.transaction()?;

        let framework_exists = tx
          .query_row(
            "SELECT 1 FROM frameworks WHERE framework_id = ?1",
            rusqlite::params![framework_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !framework_exists {
          return Ok(None);
        }

        let existing_policy: Option<String> = tx
          .query_row(
            "SELECT policy_id FROM policies WHERE framework_id = ?1 AND title = ?2",
            rusqlite::params![framework_str, policy_title],
            |r| r.get(0),
          )
          .optional()?;
        let policy_id = match existing_policy {
          Some(id) => id,
          None => {
            let id = encode_uuid(Uuid::new_v4());
            tx.execute(
              "INSERT INTO policies (policy_id, framework_id, title) VALUES (?1, ?2, ?3)",
              rusqlite::params![id, framework_str, policy_title],
            )?;
            id
          }
        };

        let existing_revision: Option<String> = tx
          .query_row(
            "SELECT revision_id FROM revisions WHERE policy_id = ?1 AND version = ?2",
            rusqlite::params![policy_id, version],
            |r| r.get(0),
          )
          .optional()?;
        let revision_id = match existing_revision {
          Some(id) => id,
          None => {
            let id = encode_uuid(Uuid::new_v4());
            tx.execute(
              "INSERT INTO revisions (revision_id, policy_id, version, created_at)
               VALUES (?1, ?2, ?3, ?4)",
              rusqlite::params![id, policy_id, version, created_str],
            )?;
            id
          }
        };

        {
          let mut upsert = tx.prepare(
            "INSERT INTO sections (revision_id, section_number, content, archived)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (revision_id, section_number)
             DO UPDATE SET content = excluded.content, archived = excluded.archived",
          )?;
          for s in &sections {
            upsert.execute(rusqlite::params![
              revision_id,
              s.section_number,
              s.content,
              s.archived,
            ])?;
          }

          let mut insert_diff = tx.prepare(
            "INSERT INTO diffs (diff_id, revision_id, section_number, diff_text, change_details)
             VALUES (?1, ?2, ?3, ?4, ?5)",
          )?;
          for (diff_id, section_number, diff_text, details) in &diff_rows {
            insert_diff.execute(rusqlite::params![
              diff_id,
              revision_id,
              section_number,
              diff_text,
              details,
            ])?;
          }
        }

        tx.execute(
          "UPDATE revisions SET change_summary = ?1 WHERE revision_id = ?2",
          rusqlite::params![summary_json, revision_id],
        )?;

        let raw = tx.query_row(
          &format!("SELECT {REVISION_COLUMNS} FROM revisions WHERE revision_id = ?1"),
          rusqlite::params![revision_id],
          RawRevision::from_row,
        )?;

        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    raw
      .ok_or(Error::FrameworkNotFound(framework_id))?
      .into_revision()
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn list_diffs(&self, revision_id: Uuid) -> Result<Vec<DiffListing>> {
    let id_str = encode_uuid(revision_id);

    Ok(
      self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare(
            "SELECT section_number, diff_text FROM diffs
             WHERE revision_id = ?1 ORDER BY rowid",
          )?;
          let rows = stmt
            .query_map(rusqlite::params![id_str], |row| {
              Ok(DiffListing {
                section_number: row.get(0)?,
                diff_text:      row.get(1)?,
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }

  async fn revision_view(&self, revision_id: Uuid) -> Result<Option<RevisionView>> {
    let id_str = encode_uuid(revision_id);

    let found = self
      .conn
      .call(move |conn| {
        let head: Option<(String, String, String, String, String)> = conn
          .query_row(
            "SELECT r.revision_id, r.version, p.policy_id, p.title, p.framework_id
             FROM revisions r
             JOIN policies  p ON p.policy_id = r.policy_id
             WHERE r.revision_id = ?1",
            rusqlite::params![id_str],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
          )
          .optional()?;

        let Some(head) = head else { return Ok(None) };
        let sections = query_sections(conn, &head.0, true)?;
        Ok(Some((head, sections)))
      })
      .await?;

    let Some(((rev_id, version, policy_id, title, framework_id), mut sections)) = found else {
      return Ok(None);
    };
    sections.sort_by(|a, b| compare_labels(&a.section_number, &b.section_number));

    Ok(Some(RevisionView {
      revision_id: decode_uuid(&rev_id)?,
      version,
      policy_id: decode_uuid(&policy_id)?,
      policy_title: title,
      framework_id: decode_uuid(&framework_id)?,
      sections,
    }))
  }

  async fn policy_history(&self, policy_id: Uuid) -> Result<Option<PolicyHistory>> {
    let id_str = encode_uuid(policy_id);

    let found: Option<(String, Vec<RawRevision>)> = self
      .conn
      .call(move |conn| {
        let title: Option<String> = conn
          .query_row(
            "SELECT title FROM policies WHERE policy_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;
        let Some(title) = title else { return Ok(None) };

        let mut stmt = conn.prepare(&format!(
          "SELECT {REVISION_COLUMNS} FROM revisions
           WHERE policy_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let revisions = stmt
          .query_map(rusqlite::params![id_str], RawRevision::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some((title, revisions)))
      })
      .await?;

    let Some((policy, raws)) = found else { return Ok(None) };
    let history = raws
      .into_iter()
      .map(|raw| {
        let revision = raw.into_revision()?;
        Ok(HistoryEntry {
          revision_id: revision.revision_id,
          version:     revision.version,
          created_at:  revision.created_at,
          changes:     revision.change_summary,
        })
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(Some(PolicyHistory { policy, history }))
  }
}
