//! Handlers for the vote ledger.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/vote` | Body: `{"candidate_id":7}`; `{"ok":true}` or 409 + [`VoteConflict`] |
//! | `GET`  | `/votes/mine` | The caller's vote records |
//! | `GET`  | `/votes/stats` | Admin; stored vs. ledger tallies |
//! | `POST` | `/votes/sync` | Admin; overwrite stored tallies with ledger counts |
//!
//! [`VoteConflict`]: fer_core::vote::VoteConflict

use axum::{
  Json,
  extract::State,
};
use fer_core::{
  store::ContestStore,
  vote::{SyncReport, VoteOutcome, VoteRecord, VoteStats},
};
use serde::{Deserialize, Serialize};

use crate::{
  ApiState,
  error::ApiError,
  extract::{Admin, Caller},
};

// ─── Cast ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CastBody {
  pub candidate_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CastResponse {
  pub ok:   bool,
  pub vote: VoteRecord,
}

/// `POST /vote` body: `{"candidate_id": <id>}`
pub async fn cast<S>(
  Caller(caller): Caller,
  State(state): State<ApiState<S>>,
  Json(body): Json<CastBody>,
) -> Result<Json<CastResponse>, ApiError>
where
  S: ContestStore,
{
  let outcome = state
    .store
    .cast_vote(caller.id.clone(), state.edition.to_string(), body.candidate_id)
    .await
    .map_err(ApiError::from_store)?;

  match outcome {
    VoteOutcome::Accepted(vote) => {
      tracing::info!(
        voter = %caller.id,
        candidate = vote.candidate_id,
        category = %vote.category,
        "vote accepted"
      );
      Ok(Json(CastResponse { ok: true, vote }))
    }
    VoteOutcome::AlreadyVoted(conflict) => {
      tracing::debug!(voter = %caller.id, category = %conflict.category, "duplicate vote");
      Err(ApiError::AlreadyVoted(conflict))
    }
    VoteOutcome::NotEnrolled => Err(ApiError::NotEnrolled),
    VoteOutcome::UnknownCandidate(id) => {
      Err(ApiError::NotFound(format!("candidate {id} not found")))
    }
  }
}

// ─── Mine ─────────────────────────────────────────────────────────────────────

/// `GET /votes/mine`
pub async fn mine<S>(
  Caller(caller): Caller,
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<VoteRecord>>, ApiError>
where
  S: ContestStore,
{
  let votes = state
    .store
    .votes_of(caller.id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(votes))
}

// ─── Admin ────────────────────────────────────────────────────────────────────

/// `GET /votes/stats`
pub async fn stats<S>(
  _admin: Admin,
  State(state): State<ApiState<S>>,
) -> Result<Json<VoteStats>, ApiError>
where
  S: ContestStore,
{
  let stats = state.store.vote_stats().await.map_err(ApiError::from_store)?;
  Ok(Json(stats))
}

/// `POST /votes/sync`
pub async fn sync<S>(
  Admin(admin): Admin,
  State(state): State<ApiState<S>>,
) -> Result<Json<SyncReport>, ApiError>
where
  S: ContestStore,
{
  let report = state.store.sync_votes().await.map_err(ApiError::from_store)?;
  tracing::info!(admin = %admin.id, updated = report.updated, "vote tallies synced");
  Ok(Json(report))
}
