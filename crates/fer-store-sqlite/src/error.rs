//! Error type for `fer-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] fer_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored value that does not decode into its domain type.
  #[error("corrupt row: {0}")]
  Decode(String),

  #[error("candidate not found: {0}")]
  CandidateNotFound(i64),

  #[error("slug already taken: {0:?}")]
  SlugTaken(String),

  #[error("username already taken: {0:?}")]
  UsernameTaken(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for fer_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      Error::CandidateNotFound(id) => fer_core::Error::CandidateNotFound(id),
      Error::SlugTaken(slug) => fer_core::Error::SlugTaken(slug),
      Error::UsernameTaken(name) => fer_core::Error::UsernameTaken(name),
      other => fer_core::Error::Backend(Box::new(other)),
    }
  }
}
