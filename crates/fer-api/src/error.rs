//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use fer_core::vote::VoteConflict;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("authentication required")]
  Unauthenticated,

  #[error("forbidden")]
  Forbidden,

  /// The caller is authenticated but holds no participant flag.
  #[error("not enrolled in the current edition")]
  NotEnrolled,

  #[error("already voted in category {}", .0.category)]
  AlreadyVoted(VoteConflict),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a store error through its [`fer_core::Error`] form.
  pub fn from_store<E: Into<fer_core::Error>>(e: E) -> Self {
    match e.into() {
      fer_core::Error::CandidateNotFound(id) => {
        Self::NotFound(format!("candidate {id} not found"))
      }
      e @ (fer_core::Error::SlugTaken(_) | fer_core::Error::UsernameTaken(_)) => {
        Self::Conflict(e.to_string())
      }
      e @ (fer_core::Error::UnknownCategory(_)
      | fer_core::Error::UnknownRole(_)
      | fer_core::Error::InvalidCandidate(_)) => Self::BadRequest(e.to_string()),
      fer_core::Error::Backend(e) => Self::Store(e),
      other => Self::Store(Box::new(other)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    if let ApiError::Store(e) = &self {
      tracing::error!(error = %e, "store failure");
    }
    match self {
      ApiError::Unauthenticated => {
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthenticated" })))
          .into_response()
      }
      ApiError::Forbidden => {
        (StatusCode::FORBIDDEN, Json(json!({ "error": "forbidden" }))).into_response()
      }
      ApiError::NotEnrolled => {
        (StatusCode::FORBIDDEN, Json(json!({ "error": "not_enrolled" })))
          .into_response()
      }
      ApiError::AlreadyVoted(conflict) => {
        (StatusCode::CONFLICT, Json(conflict)).into_response()
      }
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response()
      }
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Conflict(m) => {
        (StatusCode::CONFLICT, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Store(e) => {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() })))
          .into_response()
      }
    }
  }
}
