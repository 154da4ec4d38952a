//! Handlers for `/revisions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/revisions/:id` | Live sections in label order |
//! | `GET`  | `/revisions/:id/diffs` | Diff rows in insertion order |

use axum::{
  Json,
  extract::{Path, State},
};
use clause_core::{change::DiffListing, policy::RevisionView, store::PolicyStore};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

fn not_found(id: Uuid) -> ApiError { ApiError::NotFound(format!("revision {id} not found")) }

/// `GET /revisions/:id`
pub async fn get_one<S: PolicyStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<RevisionView>, ApiError> {
  let view = state
    .store
    .revision_view(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(view))
}

/// `GET /revisions/:id/diffs`
pub async fn diffs<S: PolicyStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<DiffListing>>, ApiError> {
  state
    .store
    .get_revision(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;

  let diffs = state.store.list_diffs(id).await.map_err(ApiError::store)?;
  Ok(Json(diffs))
}
