//! Error type for `clause-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A revision was committed against a framework that does not exist.
  #[error("framework not found: {0}")]
  FrameworkNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
