//! Handlers for contest enrollment (`/participants`) and `/me`.

use axum::{
  Json,
  extract::State,
};
use fer_core::{identity::Identity, store::ContestStore};
use serde::{Deserialize, Serialize};

use crate::{ApiState, error::ApiError, extract::Caller};

/// Participant flag of the caller for the current edition.
#[derive(Debug, Serialize, Deserialize)]
pub struct Enrollment {
  pub edition:  String,
  pub enrolled: bool,
  /// `true` if this request changed the flag.
  #[serde(default)]
  pub changed:  bool,
}

/// `GET /participants`
pub async fn status<S>(
  Caller(caller): Caller,
  State(state): State<ApiState<S>>,
) -> Result<Json<Enrollment>, ApiError>
where
  S: ContestStore,
{
  let enrolled = state
    .store
    .is_enrolled(caller.id, state.edition.to_string())
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(Enrollment { edition: state.edition.to_string(), enrolled, changed: false }))
}

/// `POST /participants`
pub async fn enroll<S>(
  Caller(caller): Caller,
  State(state): State<ApiState<S>>,
) -> Result<Json<Enrollment>, ApiError>
where
  S: ContestStore,
{
  let changed = state
    .store
    .enroll(caller.id.clone(), state.edition.to_string())
    .await
    .map_err(ApiError::from_store)?;
  if changed {
    tracing::info!(voter = %caller.id, edition = %state.edition, "participant enrolled");
  }
  Ok(Json(Enrollment { edition: state.edition.to_string(), enrolled: true, changed }))
}

/// `DELETE /participants`
pub async fn withdraw<S>(
  Caller(caller): Caller,
  State(state): State<ApiState<S>>,
) -> Result<Json<Enrollment>, ApiError>
where
  S: ContestStore,
{
  let changed = state
    .store
    .withdraw(caller.id.clone(), state.edition.to_string())
    .await
    .map_err(ApiError::from_store)?;
  if changed {
    tracing::info!(voter = %caller.id, edition = %state.edition, "participant withdrew");
  }
  Ok(Json(Enrollment { edition: state.edition.to_string(), enrolled: false, changed }))
}

/// `GET /me`
pub async fn me(Caller(caller): Caller) -> Json<Identity> { Json(caller) }
