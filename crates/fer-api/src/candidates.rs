//! Handlers for `/candidates` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/public/candidates` | Optional `?category=miss\|awards`; no auth |
//! | `GET`    | `/candidates/by-slug/{slug}` | No auth; 404 if not found |
//! | `GET`    | `/candidates` | Admin; optional `?category=` |
//! | `POST`   | `/candidates` | Admin; body: [`NewCandidate`]; 201 + candidate |
//! | `GET`    | `/candidates/{id}` | Admin; 404 if not found |
//! | `PUT`    | `/candidates/{id}` | Admin; body: [`CandidateChanges`] |
//! | `DELETE` | `/candidates/{id}` | Admin; 204 |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use fer_core::{
  candidate::{Candidate, CandidateChanges, Category, NewCandidate},
  store::ContestStore,
};
use serde::Deserialize;

use crate::{ApiState, error::ApiError, extract::Admin};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub category: Option<Category>,
}

/// `GET /public/candidates[?category=<category>]`
pub async fn list_public<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Candidate>>, ApiError>
where
  S: ContestStore,
{
  let candidates = state
    .store
    .list_candidates(params.category)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(candidates))
}

/// `GET /candidates[?category=<category>]`
pub async fn list<S>(
  _admin: Admin,
  state: State<ApiState<S>>,
  params: Query<ListParams>,
) -> Result<Json<Vec<Candidate>>, ApiError>
where
  S: ContestStore,
{
  list_public(state, params).await
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /candidates/{id}`
pub async fn get_one<S>(
  _admin: Admin,
  State(state): State<ApiState<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Candidate>, ApiError>
where
  S: ContestStore,
{
  let candidate = state
    .store
    .get_candidate(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("candidate {id} not found")))?;
  Ok(Json(candidate))
}

/// `GET /candidates/by-slug/{slug}`
pub async fn get_by_slug<S>(
  State(state): State<ApiState<S>>,
  Path(slug): Path<String>,
) -> Result<Json<Candidate>, ApiError>
where
  S: ContestStore,
{
  let candidate = state
    .store
    .get_candidate_by_slug(&slug)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("candidate {slug:?} not found")))?;
  Ok(Json(candidate))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /candidates`: returns 201 + the stored [`Candidate`].
pub async fn create<S>(
  Admin(admin): Admin,
  State(state): State<ApiState<S>>,
  Json(body): Json<NewCandidate>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ContestStore,
{
  let candidate = state
    .store
    .create_candidate(body)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(admin = %admin.id, id = candidate.id, slug = %candidate.slug, "candidate created");
  Ok((StatusCode::CREATED, Json(candidate)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /candidates/{id}` body is a partial [`CandidateChanges`].
pub async fn update<S>(
  Admin(admin): Admin,
  State(state): State<ApiState<S>>,
  Path(id): Path<i64>,
  Json(changes): Json<CandidateChanges>,
) -> Result<Json<Candidate>, ApiError>
where
  S: ContestStore,
{
  let candidate = state
    .store
    .update_candidate(id, changes)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(admin = %admin.id, id, "candidate updated");
  Ok(Json(candidate))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /candidates/{id}`: also removes the vote records referencing it.
pub async fn delete_one<S>(
  Admin(admin): Admin,
  State(state): State<ApiState<S>>,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: ContestStore,
{
  state
    .store
    .delete_candidate(id)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(admin = %admin.id, id, "candidate deleted");
  Ok(StatusCode::NO_CONTENT)
}
