//! Router tests: full request path through auth middleware, `fer-api`
//! handlers and an in-memory SQLite store.

use std::{fs, path::PathBuf, sync::Arc};

use argon2::{
  Algorithm, Argon2, Params, PasswordHasher, Version, password_hash::SaltString,
};
use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use fer_core::{
  candidate::{Category, NewCandidate},
  identity::Role,
  store::ContestStore,
};
use fer_store_sqlite::SqliteStore;
use rand_core::OsRng;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use super::*;

/// Minimal-cost argon2 hash; verification reads the parameters back from
/// the PHC string, so tests stay fast.
fn cheap_hash(password: &str) -> String {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::new(
    Algorithm::Argon2id,
    Version::V0x13,
    Params::new(8, 1, 1, None).unwrap(),
  )
  .hash_password(password.as_bytes(), &salt)
  .unwrap()
  .to_string()
}

fn scratch_dir(name: &str) -> PathBuf {
  let dir = std::env::temp_dir()
    .join(format!("fer-server-{name}-{}", std::process::id()));
  let _ = fs::remove_dir_all(&dir);
  fs::create_dir_all(&dir).unwrap();
  dir
}

async fn make_state(asset_dir: PathBuf) -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let state = AppState {
    store:  Arc::new(store),
    config: Arc::new(ServerConfig {
      host:                "127.0.0.1".to_string(),
      port:                8080,
      store_path:          PathBuf::from(":memory:"),
      asset_dir,
      edition:             "fer-2025".to_string(),
      admin_username:      Some("admin".to_string()),
      admin_password_hash: Some(cheap_hash("admin-pass")),
    }),
  };
  ensure_admin(&state).await.unwrap();
  state
}

async fn member(state: &AppState<SqliteStore>, name: &str) {
  state
    .store
    .create_user(name.into(), cheap_hash("member-pass"), Role::Member)
    .await
    .unwrap();
}

async fn send(
  state: &AppState<SqliteStore>,
  method: &str,
  uri: &str,
  creds: Option<(&str, &str)>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some((user, pass)) = creds {
    builder = builder.header(
      header::AUTHORIZATION,
      format!("Basic {}", B64.encode(format!("{user}:{pass}"))),
    );
  }
  let req = match body {
    Some(v) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(v.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let res = router(state.clone()).oneshot(req).await.unwrap();
  let status = res.status();
  let bytes = axum::body::to_bytes(res.into_body(), 1024 * 1024)
    .await
    .unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
  };
  (status, value)
}

const ADMIN: Option<(&str, &str)> = Some(("admin", "admin-pass"));

fn as_member(name: &str) -> Option<(&str, &str)> { Some((name, "member-pass")) }

async fn seed(state: &AppState<SqliteStore>, name: &str, category: Category) -> i64 {
  state
    .store
    .create_candidate(NewCandidate::new(name, category))
    .await
    .unwrap()
    .id
}

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_then_me() {
  let state = make_state(scratch_dir("register")).await;

  let (status, body) = send(
    &state,
    "POST",
    "/register",
    None,
    Some(json!({ "username": "amina", "password": "long-enough" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["role"], "member");

  let (status, body) =
    send(&state, "GET", "/api/me", Some(("amina", "long-enough")), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "id": "amina", "role": "member" }));

  let (status, _) = send(
    &state,
    "POST",
    "/register",
    None,
    Some(json!({ "username": "amina", "password": "another-one" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn register_validates_input() {
  let state = make_state(scratch_dir("validate")).await;

  let (status, _) = send(
    &state,
    "POST",
    "/register",
    None,
    Some(json!({ "username": "amina", "password": "short" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(
    &state,
    "POST",
    "/register",
    None,
    Some(json!({ "username": "a b", "password": "long-enough" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bad_credentials_are_rejected() {
  let state = make_state(scratch_dir("badcreds")).await;
  member(&state, "amina").await;

  let req = Request::builder()
    .uri("/api/me")
    .header(
      header::AUTHORIZATION,
      format!("Basic {}", B64.encode("amina:wrong")),
    )
    .body(Body::empty())
    .unwrap();
  let res = router(state.clone()).oneshot(req).await.unwrap();
  assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
  assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));

  let (status, _) = send(&state, "GET", "/api/me", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ─── Candidates ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn candidate_crud_is_admin_only() {
  let state = make_state(scratch_dir("crud")).await;
  member(&state, "amina").await;
  let payload = json!({ "name": "Marie Ngassa", "category": "miss", "age": 22 });

  let (status, _) =
    send(&state, "POST", "/api/candidates", None, Some(payload.clone())).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, _) = send(
    &state,
    "POST",
    "/api/candidates",
    as_member("amina"),
    Some(payload.clone()),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, created) =
    send(&state, "POST", "/api/candidates", ADMIN, Some(payload.clone())).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["slug"], "marie-ngassa");
  assert_eq!(created["votes"], 0);
  let id = created["id"].as_i64().unwrap();

  let (status, _) =
    send(&state, "POST", "/api/candidates", ADMIN, Some(payload)).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, updated) = send(
    &state,
    "PUT",
    &format!("/api/candidates/{id}"),
    ADMIN,
    Some(json!({ "origin": "Bafoussam" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["origin"], "Bafoussam");
  assert_eq!(updated["age"], 22);

  let (status, public) = send(&state, "GET", "/api/public/candidates", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(public.as_array().unwrap().len(), 1);

  let (status, by_slug) =
    send(&state, "GET", "/api/candidates/by-slug/marie-ngassa", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(by_slug["id"], id);

  let (status, _) =
    send(&state, "DELETE", &format!("/api/candidates/{id}"), ADMIN, None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) =
    send(&state, "GET", &format!("/api/candidates/{id}"), ADMIN, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn public_list_filters_by_category() {
  let state = make_state(scratch_dir("filter")).await;
  seed(&state, "Marie", Category::Miss).await;
  seed(&state, "Jordan", Category::Awards).await;

  let (status, body) =
    send(&state, "GET", "/api/public/candidates?category=awards", None, None).await;
  assert_eq!(status, StatusCode::OK);
  let list = body.as_array().unwrap();
  assert_eq!(list.len(), 1);
  assert_eq!(list[0]["name"], "Jordan");
}

// ─── Voting ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn vote_once_per_category() {
  let state = make_state(scratch_dir("vote")).await;
  member(&state, "u1").await;
  let first = seed(&state, "Marie", Category::Miss).await;
  let second = seed(&state, "Awa", Category::Miss).await;

  let (status, body) = send(&state, "POST", "/api/participants", as_member("u1"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["enrolled"], true);

  let (status, body) = send(
    &state,
    "POST",
    "/api/vote",
    as_member("u1"),
    Some(json!({ "candidate_id": first })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["ok"], true);

  let (status, body) = send(
    &state,
    "POST",
    "/api/vote",
    as_member("u1"),
    Some(json!({ "candidate_id": second })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(
    body,
    json!({ "voted_for": first, "voted_for_name": "Marie", "category": "miss" })
  );

  assert_eq!(state.store.get_candidate(first).await.unwrap().unwrap().votes, 1);
  assert_eq!(state.store.get_candidate(second).await.unwrap().unwrap().votes, 0);

  let (_, mine) = send(&state, "GET", "/api/votes/mine", as_member("u1"), None).await;
  assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn vote_without_enrollment_is_forbidden() {
  let state = make_state(scratch_dir("enroll")).await;
  member(&state, "u1").await;
  let id = seed(&state, "Marie", Category::Miss).await;

  let (status, body) = send(
    &state,
    "POST",
    "/api/vote",
    as_member("u1"),
    Some(json!({ "candidate_id": id })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["error"], "not_enrolled");

  let (status, _) = send(
    &state,
    "POST",
    "/api/vote",
    None,
    Some(json!({ "candidate_id": id })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn withdraw_revokes_enrollment() {
  let state = make_state(scratch_dir("withdraw")).await;
  member(&state, "u1").await;

  send(&state, "POST", "/api/participants", as_member("u1"), None).await;
  let (status, body) =
    send(&state, "DELETE", "/api/participants", as_member("u1"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["changed"], true);

  let (_, body) = send(&state, "GET", "/api/participants", as_member("u1"), None).await;
  assert_eq!(body["enrolled"], false);
  assert_eq!(body["edition"], "fer-2025");
}

#[tokio::test]
async fn stats_and_sync_are_admin_only() {
  let state = make_state(scratch_dir("stats")).await;
  member(&state, "u1").await;
  let id = seed(&state, "Marie", Category::Miss).await;
  state.store.enroll("u1".into(), "fer-2025".into()).await.unwrap();
  state.store.cast_vote("u1".into(), "fer-2025".into(), id).await.unwrap();

  let (status, _) = send(&state, "GET", "/api/votes/stats", as_member("u1"), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, stats) = send(&state, "GET", "/api/votes/stats", ADMIN, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(stats["total_votes"], 1);
  assert_eq!(stats["candidates"][0]["actual_votes"], 1);

  let (status, report) = send(&state, "POST", "/api/votes/sync", ADMIN, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["updated"], 0);
}

// ─── Assets ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn manifest_is_served_once_generated() {
  let dir = scratch_dir("assets");
  let state = make_state(dir.clone()).await;

  let (status, _) = send(&state, "GET", "/assets/manifest.json", None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  fs::write(dir.join("clubs.jpg"), b"x").unwrap();
  manifest::generate(&dir).unwrap();

  let (status, body) = send(&state, "GET", "/assets/manifest.json", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!(["/assets/clubs.jpg"]));

  fs::remove_dir_all(&dir).unwrap();
}
