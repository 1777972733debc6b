//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings; enums as their lowercase names.

use chrono::{DateTime, Utc};
use fer_core::{
  candidate::{Candidate, Category},
  identity::{Role, User, UserAccount},
  vote::{CandidateTally, VoteRecord},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Integers ────────────────────────────────────────────────────────────────

pub fn encode_count(n: u64) -> Result<i64> {
  i64::try_from(n).map_err(|_| Error::Decode(format!("count {n} out of range")))
}

pub fn decode_count(n: i64) -> Result<u64> {
  u64::try_from(n).map_err(|_| Error::Decode(format!("negative count {n}")))
}

fn decode_age(n: Option<i64>) -> Result<Option<u32>> {
  n.map(|v| u32::try_from(v).map_err(|_| Error::Decode(format!("bad age {v}"))))
    .transpose()
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_category(s: &str) -> Result<Category> { Ok(s.parse()?) }

pub fn decode_role(s: &str) -> Result<Role> { Ok(s.parse()?) }

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// Column list matching [`RawCandidate::from_row`].
pub const CANDIDATE_COLUMNS: &str =
  "id, slug, name, category, age, origin, domain, bio, photo, votes, created_at";

/// A `candidates` row as read from SQLite, before decoding.
pub struct RawCandidate {
  pub id:         i64,
  pub slug:       String,
  pub name:       String,
  pub category:   String,
  pub age:        Option<i64>,
  pub origin:     Option<String>,
  pub domain:     Option<String>,
  pub bio:        Option<String>,
  pub photo:      Option<String>,
  pub votes:      i64,
  pub created_at: String,
}

impl RawCandidate {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      slug:       row.get(1)?,
      name:       row.get(2)?,
      category:   row.get(3)?,
      age:        row.get(4)?,
      origin:     row.get(5)?,
      domain:     row.get(6)?,
      bio:        row.get(7)?,
      photo:      row.get(8)?,
      votes:      row.get(9)?,
      created_at: row.get(10)?,
    })
  }

  pub fn into_candidate(self) -> Result<Candidate> {
    Ok(Candidate {
      id:         self.id,
      slug:       self.slug,
      name:       self.name,
      category:   decode_category(&self.category)?,
      age:        decode_age(self.age)?,
      origin:     self.origin,
      domain:     self.domain,
      bio:        self.bio,
      photo:      self.photo,
      votes:      decode_count(self.votes)?,
      created_at: Some(decode_dt(&self.created_at)?),
    })
  }
}

pub struct RawVote {
  pub voter_id:     String,
  pub category:     String,
  pub candidate_id: i64,
  pub recorded_at:  String,
}

impl RawVote {
  pub fn into_record(self) -> Result<VoteRecord> {
    Ok(VoteRecord {
      voter_id:     self.voter_id,
      category:     decode_category(&self.category)?,
      candidate_id: self.candidate_id,
      recorded_at:  decode_dt(&self.recorded_at)?,
    })
  }
}

pub struct RawTally {
  pub id:           i64,
  pub name:         String,
  pub votes:        i64,
  pub actual_votes: i64,
}

impl RawTally {
  pub fn into_tally(self) -> Result<CandidateTally> {
    Ok(CandidateTally {
      id:           self.id,
      name:         self.name,
      votes:        decode_count(self.votes)?,
      actual_votes: decode_count(self.actual_votes)?,
    })
  }
}

pub struct RawUser {
  pub username:      String,
  pub password_hash: String,
  pub role:          String,
  pub created_at:    String,
}

impl RawUser {
  pub fn into_account(self) -> Result<UserAccount> {
    Ok(UserAccount {
      user:          User {
        username:   self.username,
        role:       decode_role(&self.role)?,
        created_at: decode_dt(&self.created_at)?,
      },
      password_hash: self.password_hash,
    })
  }
}
