//! Handlers for `/policies` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/policies` | All policies by title |
//! | `POST` | `/policies/upload` | Body: [`UploadBody`]; returns 201 + [`IngestResponse`] |
//! | `POST` | `/policies/sections` | Body: [`SectionsBody`]; returns 201 + [`IngestResponse`] |
//! | `GET`  | `/policies/:id/history` | Revisions newest first |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use clause_core::{
  Error as CoreError,
  change::ChangeSummary,
  ingest::{Content, SectionInput, Submission, ingest},
  policy::{Policy, PolicyHistory},
  store::PolicyStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiState, error::ApiError, extract::ApiJson};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /policies`
pub async fn list<S: PolicyStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<Policy>>, ApiError> {
  let policies = state.store.list_policies().await.map_err(ApiError::store)?;
  Ok(Json(policies))
}

// ─── Ingestion ────────────────────────────────────────────────────────────────

/// Body of `POST /policies/upload`. Text wins when both forms are given.
///
/// A missing title or version deserialises as blank so ingestion reports it
/// as a missing required field.
#[derive(Debug, Deserialize)]
pub struct UploadBody {
  pub framework_id:    Uuid,
  #[serde(default)]
  pub policy_title:    String,
  #[serde(default)]
  pub version:         String,
  #[serde(default)]
  pub text_content:    Option<String>,
  /// A document, base64 encoded.
  #[serde(default)]
  pub document_base64: Option<String>,
}

/// Body of `POST /policies/sections`.
#[derive(Debug, Deserialize)]
pub struct SectionsBody {
  pub framework_id: Uuid,
  #[serde(default)]
  pub policy_title: String,
  #[serde(default)]
  pub version:      String,
  pub sections:     Vec<SectionInput>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
  pub revision_id:    Uuid,
  pub policy_id:      Uuid,
  pub version:        String,
  pub change_summary: ChangeSummary,
}

/// `POST /policies/upload`
pub async fn upload<S: PolicyStore>(
  State(state): State<ApiState<S>>,
  ApiJson(body): ApiJson<UploadBody>,
) -> Result<impl IntoResponse, ApiError> {
  let content = match (body.text_content, body.document_base64) {
    (Some(text), _) if !text.is_empty() => Content::Text(text),
    (_, Some(encoded)) => {
      let bytes = B64
        .decode(encoded.trim())
        .map_err(|e| ApiError::BadRequest(format!("invalid base64 document: {e}")))?;
      Content::Document(bytes)
    }
    _ => return Err(CoreError::MissingContent.into()),
  };

  submit(&state, Submission {
    framework_id: body.framework_id,
    policy_title: body.policy_title,
    version: body.version,
    content,
  })
  .await
}

/// `POST /policies/sections`
pub async fn save_sections<S: PolicyStore>(
  State(state): State<ApiState<S>>,
  ApiJson(body): ApiJson<SectionsBody>,
) -> Result<impl IntoResponse, ApiError> {
  submit(&state, Submission {
    framework_id: body.framework_id,
    policy_title: body.policy_title,
    version:      body.version,
    content:      Content::Sections(body.sections),
  })
  .await
}

async fn submit<S: PolicyStore>(
  state: &ApiState<S>,
  submission: Submission,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
  let _guard = state
    .locks
    .acquire(submission.framework_id, &submission.policy_title)
    .await;

  let policy  = submission.policy_title.clone();
  let version = submission.version.clone();
  let ingested = ingest(&*state.store, &*state.extractor, submission)
    .await
    .inspect_err(|e| {
      if !matches!(e, CoreError::Persistence { .. }) {
        tracing::warn!(%policy, %version, error = %e, "rejected submission");
      }
    })?;

  Ok((
    StatusCode::CREATED,
    Json(IngestResponse {
      revision_id:    ingested.revision.revision_id,
      policy_id:      ingested.revision.policy_id,
      version:        ingested.revision.version,
      change_summary: ingested.summary,
    }),
  ))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /policies/:id/history`
pub async fn history<S: PolicyStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<PolicyHistory>, ApiError> {
  let history = state
    .store
    .policy_history(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("policy {id} not found")))?;
  Ok(Json(history))
}
