//! SQL schema for the Clause SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS frameworks (
    framework_id TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    description  TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS policies (
    policy_id    TEXT PRIMARY KEY,
    framework_id TEXT NOT NULL REFERENCES frameworks(framework_id),
    title        TEXT NOT NULL,
    UNIQUE (framework_id, title)
);

-- Revisions are ordered by created_at, then by rowid for equal timestamps.
CREATE TABLE IF NOT EXISTS revisions (
    revision_id    TEXT PRIMARY KEY,
    policy_id      TEXT NOT NULL REFERENCES policies(policy_id),
    version        TEXT NOT NULL,
    created_at     TEXT NOT NULL,   -- RFC 3339 UTC, microsecond precision
    change_summary TEXT,            -- JSON ChangeSummary of the last ingestion
    UNIQUE (policy_id, version)
);

-- Sections are never deleted; dropped ones are archived.
CREATE TABLE IF NOT EXISTS sections (
    revision_id    TEXT NOT NULL REFERENCES revisions(revision_id),
    section_number TEXT NOT NULL,
    content        TEXT NOT NULL,
    archived       INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (revision_id, section_number)
);

-- Diff rows are strictly append-only.
CREATE TABLE IF NOT EXISTS diffs (
    diff_id        TEXT PRIMARY KEY,
    revision_id    TEXT NOT NULL REFERENCES revisions(revision_id),
    section_number TEXT NOT NULL,
    diff_text      TEXT NOT NULL,
    change_details TEXT NOT NULL    -- JSON ChangeDetails
);

CREATE INDEX IF NOT EXISTS revisions_policy_idx ON revisions(policy_id, created_at);
CREATE INDEX IF NOT EXISTS diffs_revision_idx   ON diffs(revision_id);

PRAGMA user_version = 1;
";
