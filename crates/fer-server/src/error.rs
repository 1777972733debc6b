//! Error types and axum `IntoResponse` implementation for the server shell.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("conflict: {0}")]
  Conflict(String),
  #[error("password hashing failed: {0}")]
  Hash(String),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn from_store<E: Into<fer_core::Error>>(e: E) -> Self {
    match e.into() {
      e @ fer_core::Error::UsernameTaken(_) => Error::Conflict(e.to_string()),
      fer_core::Error::Backend(e) => Error::Store(e),
      other => Error::Store(Box::new(other)),
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": "unauthenticated" })),
        )
          .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"fer\""),
        );
        res
      }
      Error::BadRequest(msg) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
      }
      Error::Conflict(msg) => {
        (StatusCode::CONFLICT, Json(json!({ "error": msg }))).into_response()
      }
      Error::Hash(msg) => {
        tracing::error!(error = %msg, "password hashing failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": msg })))
          .into_response()
      }
      Error::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() })))
          .into_response()
      }
    }
  }
}
