//! Identity extractors.
//!
//! Authentication happens outside this crate: the embedding server verifies
//! credentials and inserts an [`Identity`] into the request extensions. These
//! extractors only read it.

use axum::{extract::FromRequestParts, http::request::Parts};
use fer_core::identity::Identity;

use crate::error::ApiError;

/// Any authenticated caller.
pub struct Caller(pub Identity);

/// An authenticated caller with the admin role.
pub struct Admin(pub Identity);

impl<St: Send + Sync> FromRequestParts<St> for Caller {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &St,
  ) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<Identity>()
      .cloned()
      .map(Caller)
      .ok_or(ApiError::Unauthenticated)
  }
}

impl<St: Send + Sync> FromRequestParts<St> for Admin {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &St,
  ) -> Result<Self, Self::Rejection> {
    let Caller(identity) = Caller::from_request_parts(parts, state).await?;
    if !identity.is_admin() {
      return Err(ApiError::Forbidden);
    }
    Ok(Admin(identity))
  }
}
