//! Client-side vote ledger.
//!
//! Gates a vote attempt on identity and enrollment, short-circuits on the
//! local marker, and otherwise defers to the server, which holds the only
//! authoritative record. Local markers exist for immediate feedback and are
//! repaired whenever the server reports a conflict.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fer_core::{
  candidate::{Candidate, Category},
  identity::Identity,
  vote::{VoteConflict, VoteRecord},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
  client::ApiClient,
  error::{ClientError, StorageError, VoteError},
  local::{self, LocalStorage},
};

// ─── Backend ──────────────────────────────────────────────────────────────────

/// What the server made of a submitted vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
  Accepted(VoteRecord),
  /// The voter already holds a vote in this category.
  Conflict(VoteConflict),
}

/// The authoritative side of the ledger.
pub trait VoteBackend: Send + Sync {
  async fn submit_vote(&self, candidate_id: i64) -> Result<Submission, ClientError>;
  async fn my_votes(&self) -> Result<Vec<VoteRecord>, ClientError>;
  async fn enroll(&self) -> Result<(), ClientError>;
  async fn withdraw(&self) -> Result<(), ClientError>;
}

impl VoteBackend for ApiClient {
  async fn submit_vote(&self, candidate_id: i64) -> Result<Submission, ClientError> {
    self.cast_vote(candidate_id).await
  }

  async fn my_votes(&self) -> Result<Vec<VoteRecord>, ClientError> {
    ApiClient::my_votes(self).await
  }

  async fn enroll(&self) -> Result<(), ClientError> {
    ApiClient::enroll(self).await.map(drop)
  }

  async fn withdraw(&self) -> Result<(), ClientError> {
    ApiClient::withdraw(self).await.map(drop)
  }
}

// ─── Local records ────────────────────────────────────────────────────────────

/// Local record of the vote a voter holds in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteMarker {
  pub candidate_id:   i64,
  #[serde(default)]
  pub candidate_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ParticipantFlag {
  enrolled_at: DateTime<Utc>,
}

// ─── Ledger ───────────────────────────────────────────────────────────────────

pub struct VoteLedger<B> {
  backend: B,
  storage: Arc<LocalStorage>,
  edition: String,
}

impl<B: VoteBackend> VoteLedger<B> {
  pub fn new(backend: B, storage: Arc<LocalStorage>, edition: impl Into<String>) -> Self {
    Self { backend, storage, edition: edition.into() }
  }

  pub fn edition(&self) -> &str { &self.edition }

  /// Try to cast a vote for `candidate`.
  ///
  /// On acceptance the local marker is written and `candidate.votes` is
  /// incremented in place. A server conflict rewrites the marker to the
  /// record the server holds.
  pub async fn attempt_vote(
    &self,
    identity: Option<&Identity>,
    candidate: &mut Candidate,
  ) -> Result<VoteRecord, VoteError> {
    let voter = identity.ok_or(VoteError::Unauthenticated)?;

    if !self.is_enrolled(&voter.id).map_err(unavailable)? {
      return Err(VoteError::NotEnrolled);
    }

    let category = candidate.category;
    if let Some(marker) = self.voted_for(&voter.id, category).map_err(unavailable)? {
      debug!(voter = %voter.id, %category, "local marker present; not submitting");
      return Err(already_voted(category, marker));
    }

    match self.backend.submit_vote(candidate.id).await {
      Ok(Submission::Accepted(record)) => {
        let marker = VoteMarker {
          candidate_id:   candidate.id,
          candidate_name: Some(candidate.name.clone()),
        };
        self.write_marker(&voter.id, record.category, &marker);
        candidate.votes += 1;
        info!(
          voter = %voter.id,
          category = %record.category,
          candidate = candidate.id,
          "vote accepted"
        );
        Ok(record)
      }
      Ok(Submission::Conflict(conflict)) => {
        warn!(
          voter = %voter.id,
          category = %conflict.category,
          voted_for = conflict.voted_for,
          "server holds an earlier vote; repairing local marker"
        );
        let marker = VoteMarker {
          candidate_id:   conflict.voted_for,
          candidate_name: conflict.voted_for_name,
        };
        self.write_marker(&voter.id, conflict.category, &marker);
        Err(already_voted(conflict.category, marker))
      }
      Err(ClientError::Unauthenticated) => Err(VoteError::Unauthenticated),
      Err(ClientError::NotEnrolled) => {
        warn!(voter = %voter.id, edition = %self.edition, "server reports no enrollment");
        if let Err(e) = self.storage.remove(&self.participant_key(&voter.id)) {
          warn!(error = %e, "failed to clear stale participant flag");
        }
        Err(VoteError::NotEnrolled)
      }
      Err(e) => Err(VoteError::BackendUnavailable(e.to_string())),
    }
  }

  /// The locally recorded vote of `voter` in `category`, if any.
  pub fn voted_for(
    &self,
    voter_id: &str,
    category: Category,
  ) -> Result<Option<VoteMarker>, StorageError> {
    self.storage.get(&local::vote_key(voter_id, category))
  }

  pub fn is_enrolled(&self, voter_id: &str) -> Result<bool, StorageError> {
    Ok(
      self
        .storage
        .get::<ParticipantFlag>(&self.participant_key(voter_id))?
        .is_some(),
    )
  }

  /// Set the local participant flag and mirror it to the server.
  ///
  /// The server call is best-effort: its failure is logged and the local
  /// flag stays set.
  pub async fn enroll(&self, identity: Option<&Identity>) -> Result<(), VoteError> {
    let voter = identity.ok_or(VoteError::Unauthenticated)?;
    let flag = ParticipantFlag { enrolled_at: Utc::now() };
    self
      .storage
      .set(&self.participant_key(&voter.id), &flag)
      .map_err(unavailable)?;

    if let Err(e) = self.backend.enroll().await {
      warn!(voter = %voter.id, error = %e, "could not mirror enrollment to server");
    }
    Ok(())
  }

  /// Clear the local participant flag and mirror it to the server.
  /// Existing votes stay recorded.
  pub async fn withdraw(&self, identity: Option<&Identity>) -> Result<(), VoteError> {
    let voter = identity.ok_or(VoteError::Unauthenticated)?;
    self
      .storage
      .remove(&self.participant_key(&voter.id))
      .map_err(unavailable)?;

    if let Err(e) = self.backend.withdraw().await {
      warn!(voter = %voter.id, error = %e, "could not mirror withdrawal to server");
    }
    Ok(())
  }

  /// Rewrite the voter's markers from the server's records. Categories the
  /// server has no record for lose their marker.
  pub async fn refresh_markers(&self, identity: &Identity) -> Result<usize, VoteError> {
    let records = match self.backend.my_votes().await {
      Ok(records) => records,
      Err(ClientError::Unauthenticated) => return Err(VoteError::Unauthenticated),
      Err(e) => return Err(VoteError::BackendUnavailable(e.to_string())),
    };

    for category in Category::ALL {
      let key = local::vote_key(&identity.id, category);
      match records.iter().find(|r| r.category == category) {
        Some(record) => {
          let kept_name = self
            .voted_for(&identity.id, category)
            .ok()
            .flatten()
            .filter(|m| m.candidate_id == record.candidate_id)
            .and_then(|m| m.candidate_name);
          let marker = VoteMarker {
            candidate_id:   record.candidate_id,
            candidate_name: kept_name,
          };
          self.storage.set(&key, &marker).map_err(unavailable)?;
        }
        None => {
          self.storage.remove(&key).map_err(unavailable)?;
        }
      }
    }
    Ok(records.len())
  }

  /// Drop every local marker of `voter_id`. Returns how many were removed.
  pub fn clear_markers(&self, voter_id: &str) -> Result<usize, StorageError> {
    let mut removed = 0;
    for category in Category::ALL {
      if self.storage.remove(&local::vote_key(voter_id, category))? {
        removed += 1;
      }
    }
    Ok(removed)
  }

  fn participant_key(&self, voter_id: &str) -> String {
    local::participant_key(voter_id, &self.edition)
  }

  fn write_marker(&self, voter_id: &str, category: Category, marker: &VoteMarker) {
    if let Err(e) = self.storage.set(&local::vote_key(voter_id, category), marker) {
      warn!(voter = %voter_id, %category, error = %e, "failed to persist vote marker");
    }
  }
}

fn already_voted(category: Category, marker: VoteMarker) -> VoteError {
  VoteError::AlreadyVoted {
    category,
    candidate_id: Some(marker.candidate_id),
    candidate_name: marker.candidate_name,
  }
}

fn unavailable(e: StorageError) -> VoteError { VoteError::BackendUnavailable(e.to_string()) }
