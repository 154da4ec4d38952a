//! Error types for `clause-core`.

use thiserror::Error;
use uuid::Uuid;

/// A type-erased error from a collaborator (store backend, text extractor).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("content must have at least a title line")]
  EmptyInput,

  #[error("missing required field: {0}")]
  MissingRequiredField(&'static str),

  #[error("either text content or a document must be provided")]
  MissingContent,

  #[error("could not obtain document text: {0}")]
  UpstreamFetch(#[source] BoxError),

  #[error("framework not found: {0}")]
  FrameworkNotFound(Uuid),

  #[error("store error while ingesting {policy:?} version {version:?}: {source}")]
  Persistence {
    policy:  String,
    version: String,
    #[source]
    source:  BoxError,
  },
}

impl Error {
  /// Wrap a store failure with the identity of the ingestion it aborted.
  pub fn persistence(
    policy: &str,
    version: &str,
    source: impl std::error::Error + Send + Sync + 'static,
  ) -> Self {
    Self::Persistence {
      policy:  policy.to_owned(),
      version: version.to_owned(),
      source:  Box::new(source),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
