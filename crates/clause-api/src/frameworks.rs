//! Handlers for `/frameworks` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/frameworks` | All frameworks by name |
//! | `POST` | `/frameworks` | Body: `{"name":"SOC 2","description":"..."}` |
//! | `GET`  | `/frameworks/:id` | 404 if not found |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use clause_core::{
  policy::{Framework, NewFramework},
  store::PolicyStore,
};
use uuid::Uuid;

use crate::{ApiState, error::ApiError, extract::ApiJson};

/// `GET /frameworks`
pub async fn list<S: PolicyStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<Framework>>, ApiError> {
  let frameworks = state.store.list_frameworks().await.map_err(ApiError::store)?;
  Ok(Json(frameworks))
}

/// `POST /frameworks`
pub async fn create<S: PolicyStore>(
  State(state): State<ApiState<S>>,
  ApiJson(mut body): ApiJson<NewFramework>,
) -> Result<impl IntoResponse, ApiError> {
  body.name = body.name.trim().to_owned();
  if body.name.is_empty() {
    return Err(ApiError::BadRequest("missing required field: name".into()));
  }

  let framework = state.store.create_framework(body).await.map_err(ApiError::store)?;
  tracing::info!(framework_id = %framework.framework_id, name = %framework.name, "created framework");
  Ok((StatusCode::CREATED, Json(framework)))
}

/// `GET /frameworks/:id`
pub async fn get_one<S: PolicyStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Framework>, ApiError> {
  let framework = state
    .store
    .get_framework(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("framework {id} not found")))?;
  Ok(Json(framework))
}
