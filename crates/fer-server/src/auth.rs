//! HTTP Basic authentication against the users table.
//!
//! Successful verification yields an [`Identity`] that the [`authenticate`]
//! middleware inserts into the request extensions for `fer-api` to read.
//! Requests without an `Authorization` header pass through anonymously;
//! requests with bad credentials are rejected outright.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::{IntoResponse, Response},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use fer_core::{identity::Identity, store::ContestStore};
use rand_core::OsRng;

use crate::{AppState, error::Error};

/// Produce an argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| Error::Hash(e.to_string()))
}

/// `true` if `password` matches the PHC string `hash`.
pub fn verify_password(password: &str, hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

/// Split a `Basic` authorization header into `(username, password)`.
///
/// Returns `Ok(None)` if there is no `Authorization` header at all.
pub fn basic_credentials(headers: &HeaderMap) -> Result<Option<(String, String)>, Error> {
  let Some(header_val) = headers.get(axum::http::header::AUTHORIZATION) else {
    return Ok(None);
  };
  let header_val = header_val.to_str().map_err(|_| Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = String::from_utf8(decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;
  Ok(Some((username.to_owned(), password.to_owned())))
}

/// Verify credentials from headers against the store.
pub async fn verify_auth<S>(
  headers: &HeaderMap,
  store: &S,
) -> Result<Option<Identity>, Error>
where
  S: ContestStore,
{
  let Some((username, password)) = basic_credentials(headers)? else {
    return Ok(None);
  };

  let account = store
    .get_user(&username)
    .await
    .map_err(Error::from_store)?
    .ok_or(Error::Unauthorized)?;

  if !verify_password(&password, &account.password_hash) {
    tracing::debug!(user = %username, "rejected credentials");
    return Err(Error::Unauthorized);
  }

  Ok(Some(account.user.identity()))
}

/// Middleware attaching the caller's [`Identity`] to the request.
pub async fn authenticate<S>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Response
where
  S: ContestStore + 'static,
{
  let headers = req.headers().clone();
  match verify_auth(&headers, state.store.as_ref()).await {
    Ok(Some(identity)) => {
      req.extensions_mut().insert(identity);
      next.run(req).await
    }
    Ok(None) => next.run(req).await,
    Err(e) => e.into_response(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::{HeaderValue, header};

  fn basic(user: &str, pass: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let encoded = B64.encode(format!("{user}:{pass}"));
    headers.insert(
      header::AUTHORIZATION,
      HeaderValue::from_str(&format!("Basic {encoded}")).unwrap(),
    );
    headers
  }

  #[test]
  fn hash_then_verify() {
    let hash = hash_password("secret-pass").unwrap();
    assert!(verify_password("secret-pass", &hash));
    assert!(!verify_password("wrong", &hash));
    assert!(!verify_password("secret-pass", "not-a-phc-string"));
  }

  #[test]
  fn missing_header_is_anonymous() {
    assert!(basic_credentials(&HeaderMap::new()).unwrap().is_none());
  }

  #[test]
  fn credentials_are_split_on_first_colon() {
    let creds = basic_credentials(&basic("amina", "pa:ss")).unwrap();
    assert_eq!(creds, Some(("amina".to_string(), "pa:ss".to_string())));
  }

  #[test]
  fn invalid_base64() {
    let mut headers = HeaderMap::new();
    headers.insert(
      header::AUTHORIZATION,
      HeaderValue::from_static("Basic !!!not-base64!!!"),
    );
    assert!(matches!(basic_credentials(&headers), Err(Error::Unauthorized)));
  }

  #[test]
  fn non_basic_scheme() {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
    assert!(matches!(basic_credentials(&headers), Err(Error::Unauthorized)));
  }
}
