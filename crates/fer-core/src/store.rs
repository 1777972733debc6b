//! The `ContestStore` trait: the authoritative backend for candidates, the
//! vote ledger, participant flags and user accounts.
//!
//! Implemented by storage backends (e.g. `fer-store-sqlite`). The API crate
//! depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  candidate::{Candidate, CandidateChanges, Category, NewCandidate},
  identity::{Role, User, UserAccount},
  vote::{SyncReport, VoteOutcome, VoteRecord, VoteStats},
};

/// Abstraction over an authoritative contest store.
///
/// Store errors convert into [`crate::Error`] so callers can tell domain
/// failures (missing candidate, duplicate slug) from backend failures without
/// knowing the concrete backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ContestStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  // ── Candidates ────────────────────────────────────────────────────────

  /// All candidates ordered by id, optionally restricted to one category.
  fn list_candidates(
    &self,
    category: Option<Category>,
  ) -> impl Future<Output = Result<Vec<Candidate>, Self::Error>> + Send + '_;

  /// Returns `None` if not found.
  fn get_candidate(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Candidate>, Self::Error>> + Send + '_;

  /// Returns `None` if not found.
  fn get_candidate_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Candidate>, Self::Error>> + Send + 'a;

  /// Persist a new candidate with a store-assigned id and a zero tally.
  ///
  /// Fails with [`crate::Error::SlugTaken`] if the slug is in use.
  fn create_candidate(
    &self,
    input: NewCandidate,
  ) -> impl Future<Output = Result<Candidate, Self::Error>> + Send + '_;

  /// Apply a partial update. Fails with [`crate::Error::CandidateNotFound`]
  /// or [`crate::Error::SlugTaken`].
  fn update_candidate(
    &self,
    id: i64,
    changes: CandidateChanges,
  ) -> impl Future<Output = Result<Candidate, Self::Error>> + Send + '_;

  /// Delete a candidate together with the vote records referencing it.
  fn delete_candidate(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Vote ledger ───────────────────────────────────────────────────────

  /// Admit or reject a vote. Recording the vote and incrementing the
  /// candidate's tally happen in one atomic step.
  fn cast_vote(
    &self,
    voter_id: String,
    edition: String,
    candidate_id: i64,
  ) -> impl Future<Output = Result<VoteOutcome, Self::Error>> + Send + '_;

  /// All vote records held by `voter_id`, one per category at most.
  fn votes_of(
    &self,
    voter_id: String,
  ) -> impl Future<Output = Result<Vec<VoteRecord>, Self::Error>> + Send + '_;

  fn vote_stats(
    &self,
  ) -> impl Future<Output = Result<VoteStats, Self::Error>> + Send + '_;

  /// Overwrite every stored tally with the ledger count. Idempotent.
  fn sync_votes(
    &self,
  ) -> impl Future<Output = Result<SyncReport, Self::Error>> + Send + '_;

  // ── Participants ──────────────────────────────────────────────────────

  /// Set the participant flag. Returns `false` if it was already set.
  fn enroll(
    &self,
    voter_id: String,
    edition: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Clear the participant flag. Returns `false` if it was not set.
  fn withdraw(
    &self,
    voter_id: String,
    edition: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn is_enrolled(
    &self,
    voter_id: String,
    edition: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Fails with [`crate::Error::UsernameTaken`] if the name is in use.
  fn create_user(
    &self,
    username: String,
    password_hash: String,
    role: Role,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Returns `None` if not found.
  fn get_user<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<UserAccount>, Self::Error>> + Send + 'a;
}
