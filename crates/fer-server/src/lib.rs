//! HTTP server shell for the FER contest platform.
//!
//! Composes the `fer-api` router with HTTP Basic authentication, account
//! registration and static asset serving (including the asset manifest).

pub mod auth;
pub mod error;
pub mod manifest;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  extract::State,
  http::StatusCode,
  middleware,
  response::IntoResponse,
  routing::post,
};
use fer_core::{identity::Role, store::ContestStore};
use serde::{Deserialize, Serialize};
use tower_http::{services::ServeDir, trace::TraceLayer};

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_asset_dir() -> PathBuf { PathBuf::from("assets") }

fn default_edition() -> String { "fer-2025".to_string() }

/// Runtime server configuration, deserialised from `config.toml` and
/// `FER_*` environment variables.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  /// Served under `/assets`; holds `manifest.json`.
  #[serde(default = "default_asset_dir")]
  pub asset_dir:           PathBuf,
  /// Contest edition that participant flags are scoped to.
  #[serde(default = "default_edition")]
  pub edition:             String,
  /// Admin account created at startup if it does not exist yet.
  #[serde(default)]
  pub admin_username:      Option<String>,
  #[serde(default)]
  pub admin_password_hash: Option<String>,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the server's own handlers and middleware.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), config: Arc::clone(&self.config) }
  }
}

/// Create the configured admin account if it is missing.
///
/// An existing account of that name is left untouched.
pub async fn ensure_admin<S>(state: &AppState<S>) -> Result<(), Error>
where
  S: ContestStore,
{
  let (Some(username), Some(hash)) =
    (&state.config.admin_username, &state.config.admin_password_hash)
  else {
    tracing::warn!("no admin account configured");
    return Ok(());
  };

  if state
    .store
    .get_user(username)
    .await
    .map_err(Error::from_store)?
    .is_some()
  {
    return Ok(());
  }

  state
    .store
    .create_user(username.clone(), hash.clone(), Role::Admin)
    .await
    .map_err(Error::from_store)?;
  tracing::info!(admin = %username, "created admin account");
  Ok(())
}

// ─── Registration ─────────────────────────────────────────────────────────────

const MIN_PASSWORD_LEN: usize = 8;
const MAX_USERNAME_LEN: usize = 64;

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub username: String,
  pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Registered {
  pub username: String,
  pub role:     Role,
}

fn validate_username(username: &str) -> Result<(), Error> {
  let ok = !username.is_empty()
    && username.len() <= MAX_USERNAME_LEN
    && username
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'));
  if ok {
    Ok(())
  } else {
    Err(Error::BadRequest(format!("invalid username {username:?}")))
  }
}

/// `POST /register` body: `{"username":"...","password":"..."}`.
/// Creates a member account; 409 if the username is taken.
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, Error>
where
  S: ContestStore,
{
  let username = body.username.trim().to_owned();
  validate_username(&username)?;
  if body.password.chars().count() < MIN_PASSWORD_LEN {
    return Err(Error::BadRequest(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }

  let hash = auth::hash_password(&body.password)?;
  let user = state
    .store
    .create_user(username, hash, Role::Member)
    .await
    .map_err(Error::from_store)?;

  tracing::info!(user = %user.username, "account registered");
  Ok((
    StatusCode::CREATED,
    Json(Registered { username: user.username, role: user.role }),
  ))
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ContestStore + 'static,
{
  let api = fer_api::api_router(state.store.clone(), state.config.edition.clone());

  let assets = ServeDir::new(&state.config.asset_dir);

  Router::new()
    .route("/register", post(register::<S>))
    .with_state(state.clone())
    .nest("/api", api)
    .nest_service(manifest::ASSET_PREFIX, assets)
    .layer(middleware::from_fn_with_state(state, auth::authenticate::<S>))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests;
