//! JSON REST API for the FER contest.
//!
//! Exposes an axum [`Router`] backed by any [`fer_core::store::ContestStore`].
//! Authentication, TLS, and transport concerns are the caller's
//! responsibility: the embedding server must insert a
//! [`fer_core::identity::Identity`] request extension for authenticated
//! requests (see [`extract`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", fer_api::api_router(store.clone(), "fer-2025"))
//! ```

pub mod candidates;
pub mod error;
pub mod extract;
pub mod participants;
pub mod votes;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use fer_core::store::ContestStore;

pub use error::ApiError;

/// State shared by all API handlers.
pub struct ApiState<S> {
  pub store:   Arc<S>,
  /// Contest edition that participant flags are scoped to.
  pub edition: Arc<str>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), edition: Arc::clone(&self.edition) }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, edition: impl Into<Arc<str>>) -> Router<()>
where
  S: ContestStore + 'static,
{
  let state = ApiState { store, edition: edition.into() };

  Router::new()
    // Candidates
    .route("/public/candidates", get(candidates::list_public::<S>))
    .route("/candidates/by-slug/{slug}", get(candidates::get_by_slug::<S>))
    .route("/candidates", get(candidates::list::<S>).post(candidates::create::<S>))
    .route(
      "/candidates/{id}",
      get(candidates::get_one::<S>)
        .put(candidates::update::<S>)
        .delete(candidates::delete_one::<S>),
    )
    // Vote ledger
    .route("/vote", post(votes::cast::<S>))
    .route("/votes/mine", get(votes::mine::<S>))
    .route("/votes/stats", get(votes::stats::<S>))
    .route("/votes/sync", post(votes::sync::<S>))
    // Enrollment and identity
    .route(
      "/participants",
      get(participants::status::<S>)
        .post(participants::enroll::<S>)
        .delete(participants::withdraw::<S>),
    )
    .route("/me", get(participants::me))
    .with_state(state)
}
