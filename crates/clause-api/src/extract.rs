//! Request extractors whose rejections use the API's JSON error shape.

use axum::extract::{FromRequest, rejection::JsonRejection};

use crate::error::ApiError;

/// [`axum::Json`], but a body that fails to parse is a 400 with
/// `{"error": ..}` instead of axum's plain-text rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}
