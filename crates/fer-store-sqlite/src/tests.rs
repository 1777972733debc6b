//! Integration tests for `SqliteStore` against an in-memory database.

use fer_core::{
  candidate::{CandidateChanges, Category, NewCandidate},
  identity::Role,
  store::ContestStore,
  vote::VoteOutcome,
};

use crate::{Error, SqliteStore};

const EDITION: &str = "fer-2025";

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn enrolled(s: &SqliteStore, voter: &str) {
  s.enroll(voter.into(), EDITION.into()).await.unwrap();
}

async fn vote(s: &SqliteStore, voter: &str, candidate_id: i64) -> VoteOutcome {
  s.cast_vote(voter.into(), EDITION.into(), candidate_id)
    .await
    .unwrap()
}

fn miss(name: &str) -> NewCandidate { NewCandidate::new(name, Category::Miss) }

fn awards(name: &str) -> NewCandidate { NewCandidate::new(name, Category::Awards) }

// ─── Candidates ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_candidate() {
  let s = store().await;

  let mut input = miss("Marie Ngassa");
  input.age = Some(22);
  input.origin = Some("Yaoundé".into());
  let created = s.create_candidate(input).await.unwrap();

  assert_eq!(created.slug, "marie-ngassa");
  assert_eq!(created.votes, 0);
  assert!(created.created_at.is_some());

  let by_id = s.get_candidate(created.id).await.unwrap().unwrap();
  assert_eq!(by_id.name, "Marie Ngassa");
  assert_eq!(by_id.age, Some(22));
  assert_eq!(by_id.origin.as_deref(), Some("Yaoundé"));

  let by_slug = s.get_candidate_by_slug("marie-ngassa").await.unwrap().unwrap();
  assert_eq!(by_slug.id, created.id);
}

#[tokio::test]
async fn get_missing_candidate_returns_none() {
  let s = store().await;
  assert!(s.get_candidate(42).await.unwrap().is_none());
  assert!(s.get_candidate_by_slug("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_slug_is_rejected() {
  let s = store().await;
  s.create_candidate(miss("Marie Ngassa")).await.unwrap();

  let err = s.create_candidate(awards("Marie  Ngassa")).await.unwrap_err();
  assert!(matches!(err, Error::SlugTaken(ref slug) if slug == "marie-ngassa"));
  assert!(matches!(
    fer_core::Error::from(err),
    fer_core::Error::SlugTaken(_)
  ));
}

#[tokio::test]
async fn list_candidates_filtered_by_category() {
  let s = store().await;
  s.create_candidate(miss("Marie")).await.unwrap();
  s.create_candidate(awards("Jordan")).await.unwrap();
  s.create_candidate(miss("Awa")).await.unwrap();

  let all = s.list_candidates(None).await.unwrap();
  assert_eq!(all.len(), 3);
  assert!(all.windows(2).all(|w| w[0].id < w[1].id));

  let misses = s.list_candidates(Some(Category::Miss)).await.unwrap();
  assert_eq!(misses.len(), 2);
  assert!(misses.iter().all(|c| c.category == Category::Miss));
}

#[tokio::test]
async fn update_candidate_applies_partial_changes() {
  let s = store().await;
  let c = s.create_candidate(miss("Marie")).await.unwrap();

  let updated = s
    .update_candidate(c.id, CandidateChanges {
      bio: Some("Étudiante en droit".into()),
      slug: Some("Marie 2025".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(updated.slug, "marie-2025");
  assert_eq!(updated.bio.as_deref(), Some("Étudiante en droit"));

  let stored = s.get_candidate(c.id).await.unwrap().unwrap();
  assert_eq!(stored, updated);
}

#[tokio::test]
async fn update_to_taken_slug_fails() {
  let s = store().await;
  s.create_candidate(miss("Marie")).await.unwrap();
  let other = s.create_candidate(miss("Awa")).await.unwrap();

  let err = s
    .update_candidate(other.id, CandidateChanges {
      slug: Some("marie".into()),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::SlugTaken(_)));
  assert_eq!(s.get_candidate(other.id).await.unwrap().unwrap().slug, "awa");
}

#[tokio::test]
async fn update_missing_candidate_fails() {
  let s = store().await;
  let err = s
    .update_candidate(9, CandidateChanges { age: Some(30), ..Default::default() })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::CandidateNotFound(9)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn edits_do_not_lose_concurrent_votes() {
  let s = store().await;
  let id = s.create_candidate(miss("Marie")).await.unwrap().id;

  const VOTERS: usize = 100;
  for i in 0..VOTERS {
    enrolled(&s, &format!("voter{i}")).await;
  }

  let mut tasks = Vec::new();
  for i in 0..VOTERS {
    let voting = s.clone();
    tasks.push(tokio::spawn(async move {
      let outcome = voting
        .cast_vote(format!("voter{i}"), EDITION.into(), id)
        .await
        .unwrap();
      assert!(matches!(outcome, VoteOutcome::Accepted(_)));
    }));
    let editing = s.clone();
    tasks.push(tokio::spawn(async move {
      editing
        .update_candidate(id, CandidateChanges {
          bio: Some(format!("bio {i}")),
          ..Default::default()
        })
        .await
        .unwrap();
    }));
  }
  for task in tasks {
    task.await.unwrap();
  }

  let stored = s.get_candidate(id).await.unwrap().unwrap();
  assert_eq!(stored.votes, VOTERS as u64);
  let stats = s.vote_stats().await.unwrap();
  assert!(stats.candidates.iter().all(|t| !t.is_drifted()));
}

#[tokio::test]
async fn edit_without_votes_keeps_stored_tally() {
  let s = store().await;
  let c = s.create_candidate(miss("Marie")).await.unwrap();
  enrolled(&s, "u1").await;
  vote(&s, "u1", c.id).await;

  let updated = s
    .update_candidate(c.id, CandidateChanges {
      name: Some("Marie N.".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(updated.votes, 1);
  assert_eq!(s.get_candidate(c.id).await.unwrap().unwrap().votes, 1);
}

#[tokio::test]
async fn delete_candidate_removes_its_votes() {
  let s = store().await;
  let c = s.create_candidate(miss("Marie")).await.unwrap();
  enrolled(&s, "u1").await;
  assert!(matches!(vote(&s, "u1", c.id).await, VoteOutcome::Accepted(_)));

  s.delete_candidate(c.id).await.unwrap();
  assert!(s.get_candidate(c.id).await.unwrap().is_none());
  assert!(s.votes_of("u1".into()).await.unwrap().is_empty());
  assert_eq!(s.vote_stats().await.unwrap().total_votes, 0);

  let err = s.delete_candidate(c.id).await.unwrap_err();
  assert!(matches!(err, Error::CandidateNotFound(_)));
}

// ─── Vote ledger ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn accepted_vote_increments_tally() {
  let s = store().await;
  let c = s.create_candidate(miss("Marie")).await.unwrap();
  enrolled(&s, "u1").await;

  match vote(&s, "u1", c.id).await {
    VoteOutcome::Accepted(record) => {
      assert_eq!(record.voter_id, "u1");
      assert_eq!(record.category, Category::Miss);
      assert_eq!(record.candidate_id, c.id);
    }
    other => panic!("expected Accepted, got {other:?}"),
  }

  assert_eq!(s.get_candidate(c.id).await.unwrap().unwrap().votes, 1);
}

#[tokio::test]
async fn second_vote_in_category_conflicts() {
  let s = store().await;
  let first = s.create_candidate(miss("Marie")).await.unwrap();
  let second = s.create_candidate(miss("Awa")).await.unwrap();
  enrolled(&s, "u1").await;

  vote(&s, "u1", first.id).await;
  for _ in 0..3 {
    match vote(&s, "u1", second.id).await {
      VoteOutcome::AlreadyVoted(conflict) => {
        assert_eq!(conflict.voted_for, first.id);
        assert_eq!(conflict.voted_for_name.as_deref(), Some("Marie"));
        assert_eq!(conflict.category, Category::Miss);
      }
      other => panic!("expected AlreadyVoted, got {other:?}"),
    }
  }

  assert_eq!(s.get_candidate(first.id).await.unwrap().unwrap().votes, 1);
  assert_eq!(s.get_candidate(second.id).await.unwrap().unwrap().votes, 0);
  assert_eq!(s.votes_of("u1".into()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn categories_are_independent() {
  let s = store().await;
  let m = s.create_candidate(miss("Marie")).await.unwrap();
  let a = s.create_candidate(awards("Jordan")).await.unwrap();
  enrolled(&s, "u1").await;

  assert!(matches!(vote(&s, "u1", m.id).await, VoteOutcome::Accepted(_)));
  assert!(matches!(vote(&s, "u1", a.id).await, VoteOutcome::Accepted(_)));
  assert_eq!(s.votes_of("u1".into()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn vote_requires_enrollment() {
  let s = store().await;
  let c = s.create_candidate(miss("Marie")).await.unwrap();

  assert_eq!(vote(&s, "u1", c.id).await, VoteOutcome::NotEnrolled);
  assert_eq!(s.vote_stats().await.unwrap().total_votes, 0);

  // Enrollment for another edition does not count.
  s.enroll("u1".into(), "fer-2024".into()).await.unwrap();
  assert_eq!(vote(&s, "u1", c.id).await, VoteOutcome::NotEnrolled);
}

#[tokio::test]
async fn vote_for_unknown_candidate() {
  let s = store().await;
  enrolled(&s, "u1").await;
  assert_eq!(vote(&s, "u1", 77).await, VoteOutcome::UnknownCandidate(77));
}

#[tokio::test]
async fn sync_repairs_drifted_tallies() {
  let s = store().await;
  let m = s.create_candidate(miss("Marie")).await.unwrap();
  let a = s.create_candidate(awards("Jordan")).await.unwrap();
  for voter in ["u1", "u2", "u3"] {
    enrolled(&s, voter).await;
    vote(&s, voter, m.id).await;
  }

  // Administrative corrections that disagree with the ledger.
  s.update_candidate(m.id, CandidateChanges { votes: Some(10), ..Default::default() })
    .await
    .unwrap();
  s.update_candidate(a.id, CandidateChanges { votes: Some(4), ..Default::default() })
    .await
    .unwrap();

  let before = s.vote_stats().await.unwrap();
  assert_eq!(before.total_votes, 3);
  assert!(before.candidates.iter().all(|t| t.is_drifted()));

  let report = s.sync_votes().await.unwrap();
  assert_eq!(report.updated, 2);
  for tally in &report.stats.candidates {
    assert_eq!(tally.votes, tally.actual_votes);
  }
  assert_eq!(s.get_candidate(m.id).await.unwrap().unwrap().votes, 3);
  assert_eq!(s.get_candidate(a.id).await.unwrap().unwrap().votes, 0);

  // Idempotent: a second run changes nothing.
  let again = s.sync_votes().await.unwrap();
  assert_eq!(again.updated, 0);
  assert_eq!(again.stats, report.stats);
}

// ─── Participants ────────────────────────────────────────────────────────────

#[tokio::test]
async fn enroll_and_withdraw() {
  let s = store().await;
  assert!(!s.is_enrolled("u1".into(), EDITION.into()).await.unwrap());

  assert!(s.enroll("u1".into(), EDITION.into()).await.unwrap());
  assert!(!s.enroll("u1".into(), EDITION.into()).await.unwrap());
  assert!(s.is_enrolled("u1".into(), EDITION.into()).await.unwrap());

  assert!(s.withdraw("u1".into(), EDITION.into()).await.unwrap());
  assert!(!s.withdraw("u1".into(), EDITION.into()).await.unwrap());
  assert!(!s.is_enrolled("u1".into(), EDITION.into()).await.unwrap());
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_user() {
  let s = store().await;
  let user = s
    .create_user("amina".into(), "$argon2id$fake".into(), Role::Member)
    .await
    .unwrap();
  assert_eq!(user.role, Role::Member);

  let account = s.get_user("amina").await.unwrap().unwrap();
  assert_eq!(account.user.username, "amina");
  assert_eq!(account.password_hash, "$argon2id$fake");
  assert!(s.get_user("nobody").await.unwrap().is_none());

  let err = s
    .create_user("amina".into(), "x".into(), Role::Admin)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UsernameTaken(_)));
}
