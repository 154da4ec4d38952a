//! JSON REST API for Clause.
//!
//! Exposes an axum [`Router`] backed by any [`clause_core::store::PolicyStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", clause_api::api_router(store.clone(), Arc::new(PlainTextExtractor)))
//! ```

pub mod error;
pub mod extract;
pub mod frameworks;
pub mod locks;
pub mod policies;
pub mod revisions;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use clause_core::{source::TextExtractor, store::PolicyStore};

pub use error::ApiError;
use locks::PolicyLocks;

// ─── State ────────────────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:     Arc<S>,
  pub extractor: Arc<dyn TextExtractor>,
  pub locks:     PolicyLocks,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      extractor: Arc::clone(&self.extractor),
      locks:     self.locks.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// Uploaded documents are turned into text by `extractor`. The returned
/// `Router<()>` can be nested into any parent router regardless of its own
/// state type.
pub fn api_router<S>(store: Arc<S>, extractor: Arc<dyn TextExtractor>) -> Router<()>
where
  S: PolicyStore + 'static,
{
  let state = ApiState { store, extractor, locks: PolicyLocks::default() };

  Router::new()
    // Frameworks
    .route("/frameworks", get(frameworks::list::<S>).post(frameworks::create::<S>))
    .route("/frameworks/{id}", get(frameworks::get_one::<S>))
    // Policies
    .route("/policies", get(policies::list::<S>))
    .route("/policies/upload", post(policies::upload::<S>))
    .route("/policies/sections", post(policies::save_sections::<S>))
    .route("/policies/{id}/history", get(policies::history::<S>))
    // Revisions
    .route("/revisions/{id}", get(revisions::get_one::<S>))
    .route("/revisions/{id}/diffs", get(revisions::diffs::<S>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
  use clause_core::{
    Error as CoreError,
    change::DiffListing,
    ingest::{Content, Submission, ingest},
    policy::{
      Framework, NewFramework, Policy, PolicyHistory, Revision, RevisionView, StoredSection,
    },
    section::SectionMap,
    source::PlainTextExtractor,
    store::RevisionCommit,
  };
  use clause_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use super::*;

  async fn app() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    api_router(Arc::new(store), Arc::new(PlainTextExtractor))
  }

  async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let resp   = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes  = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let json = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
  }

  async fn framework(app: &Router) -> String {
    let (status, body) =
      call(app, "POST", "/frameworks", Some(json!({ "name": "ISO 27001" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["framework_id"].as_str().unwrap().to_owned()
  }

  fn upload(fw: &str, version: &str, text: &str) -> Value {
    json!({
      "framework_id": fw,
      "policy_title": "Access Control",
      "version": version,
      "text_content": text,
    })
  }

  // ── Frameworks ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn frameworks_round_trip() {
    let app = app().await;
    let id  = framework(&app).await;

    let (status, list) = call(&app, "GET", "/frameworks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["name"], "ISO 27001");

    let (status, one) = call(&app, "GET", &format!("/frameworks/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(one["description"], "");
  }

  #[tokio::test]
  async fn framework_without_name_is_400() {
    let app = app().await;
    let (status, body) = call(&app, "POST", "/frameworks", Some(json!({ "name": " " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("name"));
  }

  #[tokio::test]
  async fn unknown_framework_is_404() {
    let app = app().await;
    let (status, _) = call(&app, "GET", &format!("/frameworks/{}", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let body = upload(&Uuid::new_v4().to_string(), "1.0", "1\nBody");
    let (status, _) = call(&app, "POST", "/policies/upload", Some(body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Upload ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn upload_reports_changes_against_prior() {
    let app = app().await;
    let fw  = framework(&app).await;

    let (status, first) =
      call(&app, "POST", "/policies/upload", Some(upload(&fw, "1.0", "Title\n1\nOld body"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["change_summary"]["changes"][0]["change_type"], "added");

    let (status, second) = call(
      &app,
      "POST",
      "/policies/upload",
      Some(upload(&fw, "2.0", "Title\n1\nNew body\n2\nFresh section")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["policy_id"], first["policy_id"]);

    let summary = &second["change_summary"];
    assert_eq!(summary["version_label"], "2.0");
    assert_eq!(summary["framework_name"], "ISO 27001");
    assert_eq!(summary["changes"][0]["section_number"], "1");
    assert_eq!(summary["changes"][0]["change_type"], "modified");
    assert_eq!(summary["changes"][1]["change_type"], "added");
    assert_eq!(summary["stats"], json!({
      "sections_added": 1,
      "sections_modified": 1,
      "sections_removed": 0,
      "total_sections": 2,
    }));
  }

  #[tokio::test]
  async fn document_upload_is_decoded() {
    let app = app().await;
    let fw  = framework(&app).await;

    let body = json!({
      "framework_id": fw,
      "policy_title": "Access Control",
      "version": "1.0",
      "document_base64": B64.encode("Title\n1\nFrom a file"),
    });
    let (status, out) = call(&app, "POST", "/policies/upload", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(out["change_summary"]["changes"][0]["new_content"], "From a file");
  }

  #[tokio::test]
  async fn undecodable_document_is_422() {
    let app = app().await;
    let fw  = framework(&app).await;

    let body = json!({
      "framework_id": fw,
      "policy_title": "Access Control",
      "version": "1.0",
      "document_base64": B64.encode([0xff_u8, 0xfe, 0x00]),
    });
    let (status, _) = call(&app, "POST", "/policies/upload", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  }

  #[tokio::test]
  async fn invalid_submissions_are_400() {
    let app = app().await;
    let fw  = framework(&app).await;

    let no_content = json!({
      "framework_id": fw,
      "policy_title": "Access Control",
      "version": "1.0",
    });
    let blank_text = upload(&fw, "1.0", "   ");
    let no_version = upload(&fw, "", "1\nBody");
    let bad_base64 = json!({
      "framework_id": fw,
      "policy_title": "Access Control",
      "version": "1.0",
      "document_base64": "not base64!",
    });

    for body in [no_content, blank_text, no_version, bad_base64] {
      let (status, err) = call(&app, "POST", "/policies/upload", Some(body)).await;
      assert_eq!(status, StatusCode::BAD_REQUEST);
      assert!(err["error"].is_string());
    }

    let (_, policies) = call(&app, "GET", "/policies", None).await;
    assert_eq!(policies, json!([]));
  }

  #[tokio::test]
  async fn absent_identity_fields_are_missing_required_fields() {
    let app = app().await;
    let fw  = framework(&app).await;

    let cases = [
      ("policy_title", json!({ "framework_id": fw, "version": "1.0", "text_content": "1\nBody" })),
      ("version", json!({ "framework_id": fw, "policy_title": "Access Control", "text_content": "1\nBody" })),
    ];
    for (field, body) in cases {
      let (status, err) = call(&app, "POST", "/policies/upload", Some(body)).await;
      assert_eq!(status, StatusCode::BAD_REQUEST, "{field}");
      assert_eq!(err["error"], format!("missing required field: {field}"));
    }

    let (status, err) = call(
      &app,
      "POST",
      "/policies/sections",
      Some(json!({ "framework_id": fw, "version": "1.0", "sections": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "missing required field: policy_title");
  }

  #[tokio::test]
  async fn malformed_bodies_get_json_errors() {
    let app = app().await;

    let req = Request::builder()
      .method("POST")
      .uri("/policies/upload")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from("{not json"))
      .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let err: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(err["error"].is_string());

    let (status, err) =
      call(&app, "POST", "/policies/upload", Some(json!({ "policy_title": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().contains("framework_id"));
  }

  // ── Sections, revisions, history ────────────────────────────────────────────

  #[tokio::test]
  async fn editor_flow() {
    let app = app().await;
    let fw  = framework(&app).await;

    let (_, v1) = call(
      &app,
      "POST",
      "/policies/upload",
      Some(upload(&fw, "1.0", "Title\n2\nTwo\n1\nOne\n3\nThree")),
    )
    .await;
    let rev1 = v1["revision_id"].as_str().unwrap();

    let (status, view) = call(&app, "GET", &format!("/revisions/{rev1}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let labels: Vec<_> = view["sections"]
      .as_array()
      .unwrap()
      .iter()
      .map(|s| s["section_number"].as_str().unwrap())
      .collect();
    assert_eq!(labels, vec!["1", "2", "3"]);

    let (status, v2) = call(
      &app,
      "POST",
      "/policies/sections",
      Some(json!({
        "framework_id": fw,
        "policy_title": "Access Control",
        "version": "1.1",
        "sections": [
          { "section_number": "1", "content": "One" },
          { "section_number": "2", "content": "Two, revised" },
        ],
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let rev2 = v2["revision_id"].as_str().unwrap();

    let (status, diffs) = call(&app, "GET", &format!("/revisions/{rev2}/diffs"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(diffs[0]["section_number"], "2");
    assert!(diffs[0]["diff_text"].as_str().unwrap().starts_with("--- 1.0:2\n+++ 1.1:2"));
    assert_eq!(diffs[1], json!({ "section_number": "3", "diff_text": "Section 3 was removed" }));

    let policy = v2["policy_id"].as_str().unwrap();
    let (status, history) = call(&app, "GET", &format!("/policies/{policy}/history"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["policy"], "Access Control");
    assert_eq!(history["history"][0]["version"], "1.1");
    assert_eq!(history["history"][1]["version"], "1.0");
    assert_eq!(history["history"][0]["changes"]["stats"]["sections_removed"], 1);
  }

  // ── Store failures ──────────────────────────────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  enum FlakyError {
    #[error(transparent)]
    Store(#[from] clause_store_sqlite::Error),
    #[error("disk I/O error")]
    Disk,
  }

  /// Reads go to SQLite; every commit fails.
  struct ReadOnlyDisk(SqliteStore);

  impl PolicyStore for ReadOnlyDisk {
    type Error = FlakyError;

    async fn create_framework(&self, input: NewFramework) -> Result<Framework, FlakyError> {
      Ok(self.0.create_framework(input).await?)
    }

    async fn list_frameworks(&self) -> Result<Vec<Framework>, FlakyError> {
      Ok(self.0.list_frameworks().await?)
    }

    async fn get_framework(&self, id: Uuid) -> Result<Option<Framework>, FlakyError> {
      Ok(self.0.get_framework(id).await?)
    }

    async fn list_policies(&self) -> Result<Vec<Policy>, FlakyError> {
      Ok(self.0.list_policies().await?)
    }

    async fn find_policy(
      &self,
      framework_id: Uuid,
      title: &str,
    ) -> Result<Option<Policy>, FlakyError> {
      Ok(self.0.find_policy(framework_id, title).await?)
    }

    async fn find_revision(
      &self,
      policy_id: Uuid,
      version: &str,
    ) -> Result<Option<Revision>, FlakyError> {
      Ok(self.0.find_revision(policy_id, version).await?)
    }

    async fn get_revision(&self, id: Uuid) -> Result<Option<Revision>, FlakyError> {
      Ok(self.0.get_revision(id).await?)
    }

    async fn latest_other_revision(
      &self,
      policy_id: Uuid,
      exclude: Option<Uuid>,
    ) -> Result<Option<(Revision, SectionMap)>, FlakyError> {
      Ok(self.0.latest_other_revision(policy_id, exclude).await?)
    }

    async fn revision_sections(&self, revision_id: Uuid) -> Result<Vec<StoredSection>, FlakyError> {
      Ok(self.0.revision_sections(revision_id).await?)
    }

    async fn commit_revision(&self, _: RevisionCommit) -> Result<Revision, FlakyError> {
      Err(FlakyError::Disk)
    }

    async fn list_diffs(&self, revision_id: Uuid) -> Result<Vec<DiffListing>, FlakyError> {
      Ok(self.0.list_diffs(revision_id).await?)
    }

    async fn revision_view(&self, revision_id: Uuid) -> Result<Option<RevisionView>, FlakyError> {
      Ok(self.0.revision_view(revision_id).await?)
    }

    async fn policy_history(&self, policy_id: Uuid) -> Result<Option<PolicyHistory>, FlakyError> {
      Ok(self.0.policy_history(policy_id).await?)
    }
  }

  #[tokio::test]
  async fn failed_commit_is_a_persistence_error() {
    let store = ReadOnlyDisk(SqliteStore::open_in_memory().await.unwrap());
    let fw = store
      .create_framework(NewFramework { name: "SOC 2".into(), description: String::new() })
      .await
      .unwrap();

    let err = ingest(&store, &PlainTextExtractor, Submission {
      framework_id: fw.framework_id,
      policy_title: "Access Control".into(),
      version:      "2.0".into(),
      content:      Content::Text("1\nBody".into()),
    })
    .await
    .unwrap_err();

    match err {
      CoreError::Persistence { policy, version, source } => {
        assert_eq!(policy, "Access Control");
        assert_eq!(version, "2.0");
        assert_eq!(source.to_string(), "disk I/O error");
      }
      other => panic!("expected a persistence error, got {other:?}"),
    }
    assert!(store.list_policies().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn failed_commit_is_500_with_context() {
    let store = ReadOnlyDisk(SqliteStore::open_in_memory().await.unwrap());
    let fw = store
      .create_framework(NewFramework { name: "SOC 2".into(), description: String::new() })
      .await
      .unwrap();
    let app = api_router(Arc::new(store), Arc::new(PlainTextExtractor));

    let body = upload(&fw.framework_id.to_string(), "2.0", "1\nBody");
    let (status, err) = call(&app, "POST", "/policies/upload", Some(body)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = err["error"].as_str().unwrap();
    assert!(message.contains("Access Control"), "{message}");
    assert!(message.contains("2.0"), "{message}");

    let (_, policies) = call(&app, "GET", "/policies", None).await;
    assert_eq!(policies, json!([]));
  }

  #[tokio::test]
  async fn missing_revision_and_policy_are_404() {
    let app = app().await;
    let id  = Uuid::new_v4();

    for uri in [
      format!("/revisions/{id}"),
      format!("/revisions/{id}/diffs"),
      format!("/policies/{id}/history"),
    ] {
      let (status, body) = call(&app, "GET", &uri, None).await;
      assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
      assert!(body["error"].as_str().unwrap().contains(&id.to_string()));
    }
  }
}
