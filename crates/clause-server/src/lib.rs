//! HTTP server assembly for Clause.
//!
//! Mounts the JSON API under `/api` on a [`SqliteStore`], with request
//! tracing. The `server` binary adds configuration loading and the listener.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Router, routing::get};
use clause_core::source::PlainTextExtractor;
use clause_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CLAUSE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/clause/clause.db") }

impl ServerConfig {
  /// Read `path` (optional) and apply `CLAUSE_*` environment overrides.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("CLAUSE"))
      .build()?
      .try_deserialize()
  }

  /// `store_path` with a leading `~/` expanded against `$HOME`.
  pub fn resolved_store_path(&self) -> PathBuf {
    let raw = self.store_path.to_string_lossy();
    match (raw.strip_prefix("~/"), std::env::var_os("HOME")) {
      (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
      _ => self.store_path.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the application router for `store`.
pub fn app(store: SqliteStore) -> Router {
  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest(
      "/api",
      clause_api::api_router(Arc::new(store), Arc::new(PlainTextExtractor)),
    )
    .layer(TraceLayer::new_for_http())
}
