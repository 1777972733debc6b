//! Vote records, admission outcomes and ledger statistics.
//!
//! At most one vote record exists per `(voter_id, category)`. Records are
//! never updated; the only way one disappears is deletion of the candidate it
//! references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::candidate::Category;

/// An accepted vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
  pub voter_id:     String,
  pub category:     Category,
  pub candidate_id: i64,
  pub recorded_at:  DateTime<Utc>,
}

/// The authoritative record a rejected vote collided with.
///
/// This is also the wire body of a `409 Conflict` from `POST /vote`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteConflict {
  pub voted_for:      i64,
  #[serde(default)]
  pub voted_for_name: Option<String>,
  pub category:       Category,
}

/// Result of submitting a vote to the authoritative store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
  /// Recorded, and the candidate's tally incremented in the same step.
  Accepted(VoteRecord),
  /// The voter already holds a vote in this category.
  AlreadyVoted(VoteConflict),
  /// The voter has no participant flag for the current edition.
  NotEnrolled,
  UnknownCandidate(i64),
}

/// Stored tally next to the ledger count for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTally {
  pub id:           i64,
  pub name:         String,
  /// The tally stored on the candidate row.
  pub votes:        u64,
  /// `count(vote records referencing id)`.
  pub actual_votes: u64,
}

impl CandidateTally {
  pub fn is_drifted(&self) -> bool { self.votes != self.actual_votes }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteStats {
  pub total_votes: u64,
  pub candidates:  Vec<CandidateTally>,
}

/// Result of recomputing stored tallies from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
  /// Number of candidates whose stored tally was overwritten.
  pub updated: u64,
  pub stats:   VoteStats,
}
