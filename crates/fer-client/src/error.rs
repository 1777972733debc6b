//! Error types for `fer-client`.

use fer_core::candidate::Category;
use thiserror::Error;

/// Failure of a single HTTP round trip.
#[derive(Debug, Error)]
pub enum ClientError {
  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),

  /// Non-2xx response not covered by a more specific variant.
  #[error("{method} {path} → {status}")]
  Status {
    method: &'static str,
    path:   String,
    status: reqwest::StatusCode,
  },

  #[error("authentication required")]
  Unauthenticated,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not enrolled in the current edition")]
  NotEnrolled,

  #[error("not found: {0}")]
  NotFound(String),
}

impl ClientError {
  /// `true` when the server understood the request and refused the caller.
  pub fn is_refusal(&self) -> bool {
    matches!(self, Self::Unauthenticated | Self::Forbidden(_) | Self::NotEnrolled)
  }
}

/// Client-local storage failure.
#[derive(Debug, Error)]
pub enum StorageError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

/// Why a vote attempt did not go through.
#[derive(Debug, Error)]
pub enum VoteError {
  /// No identity; the UI should send the user to login.
  #[error("log in to vote")]
  Unauthenticated,

  /// Identity present but no participant flag; the UI should offer
  /// enrollment.
  #[error("enroll in the contest to vote")]
  NotEnrolled,

  /// Terminal state for this category; not retryable.
  #[error("already voted in {category}")]
  AlreadyVoted {
    category:       Category,
    candidate_id:   Option<i64>,
    candidate_name: Option<String>,
  },

  /// Network or storage failure; the user may retry.
  #[error("vote could not be submitted: {0}")]
  BackendUnavailable(String),
}
