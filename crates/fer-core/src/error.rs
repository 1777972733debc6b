//! Error types for `fer-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("candidate not found: {0}")]
  CandidateNotFound(i64),

  #[error("slug already taken: {0:?}")]
  SlugTaken(String),

  #[error("username already taken: {0:?}")]
  UsernameTaken(String),

  #[error("unknown category: {0:?}")]
  UnknownCategory(String),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("invalid candidate: {0}")]
  InvalidCandidate(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// Any backend failure that has no domain meaning (I/O, SQL, transport).
  #[error("backend error: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
