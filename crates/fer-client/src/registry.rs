//! Candidate registry: one CRUD surface over a remote store with a local
//! fallback.
//!
//! Every operation is tried against the remote first. Any failure is logged
//! and the same operation is replayed against the fallback, which keeps its
//! state under [`local::CANDIDATES_KEY`]. A successful remote listing
//! refreshes that mirror.

use std::sync::Arc;

use chrono::Utc;
use fer_core::{
  candidate::{Candidate, CandidateChanges, NewCandidate},
  identity::Identity,
  vote::{SyncReport, VoteStats},
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
  client::ApiClient,
  error::{ClientError, StorageError},
  local::{self, LocalStorage},
};

// ─── Trait ────────────────────────────────────────────────────────────────────

pub trait CandidateStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  async fn list(&self) -> Result<Vec<Candidate>, Self::Error>;
  async fn get_by_slug(&self, slug: &str) -> Result<Option<Candidate>, Self::Error>;
  async fn create(&self, input: NewCandidate) -> Result<Candidate, Self::Error>;
  async fn update(&self, id: i64, changes: CandidateChanges) -> Result<Candidate, Self::Error>;
  async fn delete(&self, id: i64) -> Result<(), Self::Error>;

  /// `true` if `error` is the store refusing the caller rather than failing.
  /// Refusals are final and never replayed against the fallback.
  fn is_refusal(error: &Self::Error) -> bool {
    let _ = error;
    false
  }
}

// ─── Remote ───────────────────────────────────────────────────────────────────

/// The server's candidate registry over HTTP.
#[derive(Clone)]
pub struct RemoteStore {
  client: ApiClient,
}

impl RemoteStore {
  pub fn new(client: ApiClient) -> Self { Self { client } }

  pub fn client(&self) -> &ApiClient { &self.client }
}

impl CandidateStore for RemoteStore {
  type Error = ClientError;

  async fn list(&self) -> Result<Vec<Candidate>, ClientError> {
    self.client.list_candidates(None).await
  }

  async fn get_by_slug(&self, slug: &str) -> Result<Option<Candidate>, ClientError> {
    self.client.get_candidate_by_slug(slug).await
  }

  async fn create(&self, input: NewCandidate) -> Result<Candidate, ClientError> {
    self.client.create_candidate(&input).await
  }

  async fn update(&self, id: i64, changes: CandidateChanges) -> Result<Candidate, ClientError> {
    self.client.update_candidate(id, &changes).await
  }

  async fn delete(&self, id: i64) -> Result<(), ClientError> {
    self.client.delete_candidate(id).await
  }

  fn is_refusal(error: &ClientError) -> bool { error.is_refusal() }
}

// ─── Fallback ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum FallbackError {
  #[error(transparent)]
  Storage(#[from] StorageError),

  #[error(transparent)]
  Core(#[from] fer_core::Error),
}

/// Candidate list kept in [`LocalStorage`]. Starts empty.
#[derive(Clone)]
pub struct FallbackStore {
  storage: Arc<LocalStorage>,
}

impl FallbackStore {
  pub fn new(storage: Arc<LocalStorage>) -> Self { Self { storage } }

  fn load(&self) -> Result<Vec<Candidate>, FallbackError> {
    Ok(self.storage.get(local::CANDIDATES_KEY)?.unwrap_or_default())
  }

  fn save(&self, list: &[Candidate]) -> Result<(), FallbackError> {
    Ok(self.storage.set(local::CANDIDATES_KEY, &list)?)
  }

  /// Overwrite the mirror with an authoritative listing.
  pub fn replace_all(&self, list: &[Candidate]) -> Result<(), FallbackError> {
    self.save(list)
  }
}

impl CandidateStore for FallbackStore {
  type Error = FallbackError;

  async fn list(&self) -> Result<Vec<Candidate>, FallbackError> { self.load() }

  async fn get_by_slug(&self, slug: &str) -> Result<Option<Candidate>, FallbackError> {
    Ok(self.load()?.into_iter().find(|c| c.slug == slug))
  }

  async fn create(&self, input: NewCandidate) -> Result<Candidate, FallbackError> {
    let mut list = self.load()?;
    let id = list.iter().map(|c| c.id).max().map_or(1, |max| max + 1);
    let candidate = input.into_candidate(id, Utc::now())?;
    if list.iter().any(|c| c.slug == candidate.slug) {
      return Err(fer_core::Error::SlugTaken(candidate.slug).into());
    }
    list.push(candidate.clone());
    self.save(&list)?;
    Ok(candidate)
  }

  async fn update(&self, id: i64, changes: CandidateChanges) -> Result<Candidate, FallbackError> {
    let mut list = self.load()?;
    let idx = list
      .iter()
      .position(|c| c.id == id)
      .ok_or(fer_core::Error::CandidateNotFound(id))?;

    let mut updated = list[idx].clone();
    changes.apply(&mut updated)?;
    if list.iter().any(|c| c.id != id && c.slug == updated.slug) {
      return Err(fer_core::Error::SlugTaken(updated.slug).into());
    }
    list[idx] = updated.clone();
    self.save(&list)?;
    Ok(updated)
  }

  async fn delete(&self, id: i64) -> Result<(), FallbackError> {
    let mut list = self.load()?;
    let before = list.len();
    list.retain(|c| c.id != id);
    if list.len() == before {
      return Err(fer_core::Error::CandidateNotFound(id).into());
    }
    self.save(&list)
  }
}

// ─── Registry ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RegistryError {
  #[error("log in to change candidates")]
  Unauthenticated,

  #[error("only administrators can change candidates")]
  Forbidden,

  /// The remote refused the change for this caller.
  #[error("change refused by server: {0}")]
  Refused(String),

  #[error(transparent)]
  Fallback(#[from] FallbackError),
}

fn require_admin(identity: Option<&Identity>) -> Result<&Identity, RegistryError> {
  let identity = identity.ok_or(RegistryError::Unauthenticated)?;
  if identity.is_admin() { Ok(identity) } else { Err(RegistryError::Forbidden) }
}

/// Try-remote-then-fallback wrapper.
///
/// Remote failures are logged and the operation is replayed against the
/// fallback. Changes require an admin identity, and a remote refusal is
/// returned as is.
pub struct CandidateRegistry<R> {
  remote:   R,
  fallback: FallbackStore,
}

impl<R: CandidateStore> CandidateRegistry<R> {
  pub fn new(remote: R, fallback: FallbackStore) -> Self { Self { remote, fallback } }

  pub fn fallback(&self) -> &FallbackStore { &self.fallback }

  pub async fn list(&self) -> Result<Vec<Candidate>, FallbackError> {
    match self.remote.list().await {
      Ok(list) => {
        if let Err(e) = self.fallback.replace_all(&list) {
          warn!(error = %e, "failed to refresh local candidate mirror");
        }
        debug!(count = list.len(), "listed candidates from remote");
        Ok(list)
      }
      Err(e) => {
        warn!(error = %e, "remote list failed; using local candidates");
        self.fallback.list().await
      }
    }
  }

  pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Candidate>, FallbackError> {
    match self.remote.get_by_slug(slug).await {
      Ok(found) => Ok(found),
      Err(e) => {
        warn!(slug, error = %e, "remote lookup failed; using local candidates");
        self.fallback.get_by_slug(slug).await
      }
    }
  }

  /// Create a candidate. Admin only.
  pub async fn create(
    &self,
    identity: Option<&Identity>,
    input: NewCandidate,
  ) -> Result<Candidate, RegistryError> {
    let admin = require_admin(identity)?;
    match self.remote.create(input.clone()).await {
      Ok(created) => Ok(created),
      Err(e) if R::is_refusal(&e) => Err(RegistryError::Refused(e.to_string())),
      Err(e) => {
        warn!(
          admin = %admin.id,
          name = %input.name,
          error = %e,
          "remote create failed; creating locally"
        );
        Ok(self.fallback.create(input).await?)
      }
    }
  }

  /// Apply partial changes to a candidate. Admin only.
  pub async fn update(
    &self,
    identity: Option<&Identity>,
    id: i64,
    changes: CandidateChanges,
  ) -> Result<Candidate, RegistryError> {
    let admin = require_admin(identity)?;
    match self.remote.update(id, changes.clone()).await {
      Ok(updated) => Ok(updated),
      Err(e) if R::is_refusal(&e) => Err(RegistryError::Refused(e.to_string())),
      Err(e) => {
        warn!(admin = %admin.id, id, error = %e, "remote update failed; updating locally");
        Ok(self.fallback.update(id, changes).await?)
      }
    }
  }

  /// Delete a candidate. Admin only.
  pub async fn delete(&self, identity: Option<&Identity>, id: i64) -> Result<(), RegistryError> {
    let admin = require_admin(identity)?;
    match self.remote.delete(id).await {
      Ok(()) => Ok(()),
      Err(e) if R::is_refusal(&e) => Err(RegistryError::Refused(e.to_string())),
      Err(e) => {
        warn!(admin = %admin.id, id, error = %e, "remote delete failed; deleting locally");
        Ok(self.fallback.delete(id).await?)
      }
    }
  }
}

impl CandidateRegistry<RemoteStore> {
  /// Stored tallies next to ledger counts. Remote only.
  pub async fn stats(&self) -> Result<VoteStats, ClientError> {
    self.remote.client().vote_stats().await
  }

  /// Recompute stored tallies from the ledger. Remote only.
  pub async fn sync(&self) -> Result<SyncReport, ClientError> {
    self.remote.client().sync_votes().await
  }
}
