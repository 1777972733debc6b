//! [`SqliteStore`] is the SQLite implementation of [`ContestStore`].

use std::path::Path;

use chrono::Utc;
use fer_core::{
  candidate::{Candidate, CandidateChanges, Category, NewCandidate},
  identity::{Role, User, UserAccount},
  store::ContestStore,
  vote::{SyncReport, VoteConflict, VoteOutcome, VoteRecord, VoteStats},
};
use rusqlite::{ErrorCode, OptionalExtension as _};

use crate::{
  Error, Result,
  encode::{
    CANDIDATE_COLUMNS, RawCandidate, RawTally, RawUser, RawVote, decode_category,
    decode_count, encode_count, encode_dt,
  },
  schema::SCHEMA,
};

/// `true` for a UNIQUE / PRIMARY KEY constraint failure.
fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation
  )
}

/// Read, change and write one candidate inside `tx`.
///
/// The stored tally is only written when `changes.votes` is set; votes
/// admitted concurrently are never overwritten by an edit.
fn update_in_tx(
  tx: &rusqlite::Transaction<'_>,
  id: i64,
  changes: &CandidateChanges,
) -> Result<Candidate> {
  let db = |e: rusqlite::Error| Error::Database(e.into());

  let raw = tx
    .query_row(
      &format!("SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE id = ?1"),
      rusqlite::params![id],
      RawCandidate::from_row,
    )
    .optional()
    .map_err(db)?
    .ok_or(Error::CandidateNotFound(id))?;
  let mut candidate = raw.into_candidate()?;

  if changes.is_empty() {
    return Ok(candidate);
  }
  changes.apply(&mut candidate)?;

  let votes = changes.votes.map(encode_count).transpose()?;
  let res = tx.execute(
    "UPDATE candidates
     SET slug = ?2, name = ?3, category = ?4, age = ?5, origin = ?6,
         domain = ?7, bio = ?8, photo = ?9, votes = COALESCE(?10, votes)
     WHERE id = ?1",
    rusqlite::params![
      id,
      candidate.slug,
      candidate.name,
      candidate.category.as_str(),
      candidate.age.map(i64::from),
      candidate.origin,
      candidate.domain,
      candidate.bio,
      candidate.photo,
      votes
    ],
  );
  match res {
    Ok(_) => Ok(candidate),
    Err(e) if is_unique_violation(&e) => Err(Error::SlugTaken(candidate.slug)),
    Err(e) => Err(db(e)),
  }
}

/// What the vote transaction saw, before decoding.
enum RawVoteOutcome {
  Accepted { category: String, recorded_at: String },
  AlreadyVoted { candidate_id: i64, name: Option<String>, category: String },
  NotEnrolled,
  UnknownCandidate,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A contest store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn stats_now(&self) -> Result<VoteStats> {
    let (total, raws): (i64, Vec<RawTally>) = self
      .conn
      .call(|conn| {
        let total: i64 =
          conn.query_row("SELECT COUNT(*) FROM votes", [], |r| r.get(0))?;
        let mut stmt = conn.prepare(
          "SELECT c.id, c.name, c.votes,
                  (SELECT COUNT(*) FROM votes v WHERE v.candidate_id = c.id)
           FROM candidates c
           ORDER BY c.id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawTally {
              id:           row.get(0)?,
              name:         row.get(1)?,
              votes:        row.get(2)?,
              actual_votes: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((total, rows))
      })
      .await?;

    Ok(VoteStats {
      total_votes: decode_count(total)?,
      candidates:  raws
        .into_iter()
        .map(RawTally::into_tally)
        .collect::<Result<_>>()?,
    })
  }
}

// ─── ContestStore impl ───────────────────────────────────────────────────────

impl ContestStore for SqliteStore {
  type Error = Error;

  // ── Candidates ────────────────────────────────────────────────────────────

  async fn list_candidates(&self, category: Option<Category>) -> Result<Vec<Candidate>> {
    let category = category.map(|c| c.as_str());

    let raws: Vec<RawCandidate> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CANDIDATE_COLUMNS} FROM candidates
           WHERE ?1 IS NULL OR category = ?1
           ORDER BY id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![category], RawCandidate::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCandidate::into_candidate).collect()
  }

  async fn get_candidate(&self, id: i64) -> Result<Option<Candidate>> {
    let raw: Option<RawCandidate> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE id = ?1"),
            rusqlite::params![id],
            RawCandidate::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawCandidate::into_candidate).transpose()
  }

  async fn get_candidate_by_slug(&self, slug: &str) -> Result<Option<Candidate>> {
    let slug = slug.to_owned();

    let raw: Option<RawCandidate> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE slug = ?1"),
            rusqlite::params![slug],
            RawCandidate::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawCandidate::into_candidate).transpose()
  }

  async fn create_candidate(&self, input: NewCandidate) -> Result<Candidate> {
    let slug       = input.resolved_slug()?;
    let created_at = Utc::now();

    let insert_slug = slug.clone();
    let name        = input.name.trim().to_owned();
    let category    = input.category.as_str();
    let age         = input.age.map(i64::from);
    let origin      = input.origin.clone();
    let domain      = input.domain.clone();
    let bio         = input.bio.clone();
    let photo       = input.photo.clone();
    let at_str      = encode_dt(created_at);

    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        let res = conn.execute(
          "INSERT INTO candidates (
             slug, name, category, age, origin, domain, bio, photo, votes, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9)",
          rusqlite::params![
            insert_slug, name, category, age, origin, domain, bio, photo, at_str
          ],
        );
        match res {
          Ok(_) => Ok(Some(conn.last_insert_rowid())),
          Err(e) if is_unique_violation(&e) => Ok(None),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    let id = id.ok_or_else(|| Error::SlugTaken(slug))?;
    Ok(input.into_candidate(id, created_at)?)
  }

  async fn update_candidate(
    &self,
    id:      i64,
    changes: CandidateChanges,
  ) -> Result<Candidate> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let updated = update_in_tx(&tx, id, &changes);
        if updated.is_ok() {
          tx.commit()?;
        }
        Ok(updated)
      })
      .await?
  }

  async fn delete_candidate(&self, id: i64) -> Result<()> {
    let deleted: usize = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM votes WHERE candidate_id = ?1", rusqlite::params![id])?;
        let n = tx.execute("DELETE FROM candidates WHERE id = ?1", rusqlite::params![id])?;
        tx.commit()?;
        Ok(n)
      })
      .await?;

    if deleted == 0 {
      return Err(Error::CandidateNotFound(id));
    }
    Ok(())
  }

  // ── Vote ledger ───────────────────────────────────────────────────────────

  async fn cast_vote(
    &self,
    voter_id:     String,
    edition:      String,
    candidate_id: i64,
  ) -> Result<VoteOutcome> {
    let recorded_at = encode_dt(Utc::now());
    let tx_voter    = voter_id.clone();

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let category: Option<String> = tx
          .query_row(
            "SELECT category FROM candidates WHERE id = ?1",
            rusqlite::params![candidate_id],
            |r| r.get(0),
          )
          .optional()?;
        let Some(category) = category else {
          return Ok(RawVoteOutcome::UnknownCandidate);
        };

        let enrolled = tx
          .query_row(
            "SELECT 1 FROM participants WHERE voter_id = ?1 AND edition = ?2",
            rusqlite::params![tx_voter, edition],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !enrolled {
          return Ok(RawVoteOutcome::NotEnrolled);
        }

        let existing: Option<(i64, Option<String>)> = tx
          .query_row(
            "SELECT v.candidate_id, c.name
             FROM votes v
             LEFT JOIN candidates c ON c.id = v.candidate_id
             WHERE v.voter_id = ?1 AND v.category = ?2",
            rusqlite::params![tx_voter, category],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;
        if let Some((candidate_id, name)) = existing {
          return Ok(RawVoteOutcome::AlreadyVoted { candidate_id, name, category });
        }

        tx.execute(
          "INSERT INTO votes (voter_id, category, candidate_id, recorded_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![tx_voter, category, candidate_id, recorded_at],
        )?;
        tx.execute(
          "UPDATE candidates SET votes = votes + 1 WHERE id = ?1",
          rusqlite::params![candidate_id],
        )?;
        tx.commit()?;

        Ok(RawVoteOutcome::Accepted { category, recorded_at })
      })
      .await?;

    Ok(match raw {
      RawVoteOutcome::Accepted { category, recorded_at } => {
        VoteOutcome::Accepted(
          RawVote { voter_id, category, candidate_id, recorded_at }.into_record()?,
        )
      }
      RawVoteOutcome::AlreadyVoted { candidate_id, name, category } => {
        VoteOutcome::AlreadyVoted(VoteConflict {
          voted_for:      candidate_id,
          voted_for_name: name,
          category:       decode_category(&category)?,
        })
      }
      RawVoteOutcome::NotEnrolled => VoteOutcome::NotEnrolled,
      RawVoteOutcome::UnknownCandidate => VoteOutcome::UnknownCandidate(candidate_id),
    })
  }

  async fn votes_of(&self, voter_id: String) -> Result<Vec<VoteRecord>> {
    let raws: Vec<RawVote> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT voter_id, category, candidate_id, recorded_at
           FROM votes WHERE voter_id = ?1 ORDER BY category",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![voter_id], |row| {
            Ok(RawVote {
              voter_id:     row.get(0)?,
              category:     row.get(1)?,
              candidate_id: row.get(2)?,
              recorded_at:  row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVote::into_record).collect()
  }

  async fn vote_stats(&self) -> Result<VoteStats> { self.stats_now().await }

  async fn sync_votes(&self) -> Result<SyncReport> {
    let updated: usize = self
      .conn
      .call(|conn| {
        Ok(conn.execute(
          "UPDATE candidates
           SET votes = (SELECT COUNT(*) FROM votes v WHERE v.candidate_id = candidates.id)
           WHERE votes != (SELECT COUNT(*) FROM votes v WHERE v.candidate_id = candidates.id)",
          [],
        )?)
      })
      .await?;

    Ok(SyncReport {
      updated: updated as u64,
      stats:   self.stats_now().await?,
    })
  }

  // ── Participants ──────────────────────────────────────────────────────────

  async fn enroll(&self, voter_id: String, edition: String) -> Result<bool> {
    let at_str = encode_dt(Utc::now());
    let inserted: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO participants (voter_id, edition, enrolled_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![voter_id, edition, at_str],
        )?)
      })
      .await?;
    Ok(inserted > 0)
  }

  async fn withdraw(&self, voter_id: String, edition: String) -> Result<bool> {
    let deleted: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM participants WHERE voter_id = ?1 AND edition = ?2",
          rusqlite::params![voter_id, edition],
        )?)
      })
      .await?;
    Ok(deleted > 0)
  }

  async fn is_enrolled(&self, voter_id: String, edition: String) -> Result<bool> {
    let found = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT 1 FROM participants WHERE voter_id = ?1 AND edition = ?2",
            rusqlite::params![voter_id, edition],
            |_| Ok(()),
          )
          .optional()?
          .is_some())
      })
      .await?;
    Ok(found)
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(
    &self,
    username:      String,
    password_hash: String,
    role:          Role,
  ) -> Result<User> {
    let user = User { username, role, created_at: Utc::now() };

    let name     = user.username.clone();
    let role_str = role.as_str();
    let at_str   = encode_dt(user.created_at);

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let res = conn.execute(
          "INSERT INTO users (username, password_hash, role, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![name, password_hash, role_str, at_str],
        );
        match res {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(Error::UsernameTaken(user.username));
    }
    Ok(user)
  }

  async fn get_user(&self, username: &str) -> Result<Option<UserAccount>> {
    let username = username.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT username, password_hash, role, created_at
             FROM users WHERE username = ?1",
            rusqlite::params![username],
            |row| {
              Ok(RawUser {
                username:      row.get(0)?,
                password_hash: row.get(1)?,
                role:          row.get(2)?,
                created_at:    row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_account).transpose()
  }
}
