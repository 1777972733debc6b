//! Async HTTP client wrapping the FER JSON API.

use std::time::Duration;

use fer_core::{
  candidate::{Candidate, CandidateChanges, Category, NewCandidate},
  identity::{Identity, Role},
  vote::{SyncReport, VoteConflict, VoteRecord, VoteStats},
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{error::ClientError, ledger::Submission};

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Connection settings for the FER API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// Async HTTP client for the FER JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

// ─── Wire shapes ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct CastBody {
  candidate_id: i64,
}

#[derive(Deserialize)]
struct CastResponse {
  vote: VoteRecord,
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
  username: &'a str,
  password: &'a str,
}

/// Participant flag as reported by `/participants`.
#[derive(Debug, Clone, Deserialize)]
pub struct Enrollment {
  pub edition:  String,
  pub enrolled: bool,
  #[serde(default)]
  pub changed:  bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Registered {
  pub username: String,
  pub role:     Role,
}

// ─── Client ───────────────────────────────────────────────────────────────────

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  pub fn config(&self) -> &ApiConfig { &self.config }

  pub fn has_credentials(&self) -> bool { !self.config.username.is_empty() }

  /// Absolute URL for a server-root path such as `/assets/x.jpg`.
  pub fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn api_url(&self, path: &str) -> String { self.url(&format!("/api{path}")) }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  /// Map a non-2xx response onto the error taxonomy.
  fn check(method: &'static str, path: &str, resp: Response) -> Result<Response> {
    match resp.status() {
      s if s.is_success() => Ok(resp),
      StatusCode::UNAUTHORIZED => Err(ClientError::Unauthenticated),
      StatusCode::FORBIDDEN => Err(ClientError::Forbidden(path.to_owned())),
      StatusCode::NOT_FOUND => Err(ClientError::NotFound(path.to_owned())),
      status => Err(ClientError::Status { method, path: path.to_owned(), status }),
    }
  }

  // ── Candidates ────────────────────────────────────────────────────────────

  /// `GET /api/public/candidates[?category=<c>]`
  pub async fn list_candidates(&self, category: Option<Category>) -> Result<Vec<Candidate>> {
    let mut req = self.client.get(self.api_url("/public/candidates"));
    if let Some(c) = category {
      req = req.query(&[("category", c.as_str())]);
    }
    let resp = req.send().await?;
    Ok(Self::check("GET", "/public/candidates", resp)?.json().await?)
  }

  /// `GET /api/candidates/by-slug/<slug>`; `None` on 404.
  pub async fn get_candidate_by_slug(&self, slug: &str) -> Result<Option<Candidate>> {
    let path = format!("/candidates/by-slug/{slug}");
    let resp = self.client.get(self.api_url(&path)).send().await?;
    match Self::check("GET", &path, resp) {
      Ok(resp) => Ok(Some(resp.json().await?)),
      Err(ClientError::NotFound(_)) => Ok(None),
      Err(e) => Err(e),
    }
  }

  /// `POST /api/candidates`
  pub async fn create_candidate(&self, input: &NewCandidate) -> Result<Candidate> {
    let resp = self
      .auth(self.client.post(self.api_url("/candidates")))
      .json(input)
      .send()
      .await?;
    Ok(Self::check("POST", "/candidates", resp)?.json().await?)
  }

  /// `PUT /api/candidates/<id>`
  pub async fn update_candidate(
    &self,
    id: i64,
    changes: &CandidateChanges,
  ) -> Result<Candidate> {
    let path = format!("/candidates/{id}");
    let resp = self
      .auth(self.client.put(self.api_url(&path)))
      .json(changes)
      .send()
      .await?;
    Ok(Self::check("PUT", &path, resp)?.json().await?)
  }

  /// `DELETE /api/candidates/<id>`
  pub async fn delete_candidate(&self, id: i64) -> Result<()> {
    let path = format!("/candidates/{id}");
    let resp = self.auth(self.client.delete(self.api_url(&path))).send().await?;
    Self::check("DELETE", &path, resp)?;
    Ok(())
  }

  // ── Votes ─────────────────────────────────────────────────────────────────

  /// `POST /api/vote`
  ///
  /// A 409 is a regular outcome carrying the authoritative record; a 403
  /// with `not_enrolled` becomes [`ClientError::NotEnrolled`].
  pub async fn cast_vote(&self, candidate_id: i64) -> Result<Submission> {
    let resp = self
      .auth(self.client.post(self.api_url("/vote")))
      .json(&CastBody { candidate_id })
      .send()
      .await?;

    match resp.status() {
      StatusCode::CONFLICT => {
        let conflict: VoteConflict = resp.json().await?;
        Ok(Submission::Conflict(conflict))
      }
      StatusCode::FORBIDDEN => {
        let body: Option<ErrorBody> = resp.json().await.ok();
        match body {
          Some(b) if b.error == "not_enrolled" => Err(ClientError::NotEnrolled),
          _ => Err(ClientError::Forbidden("/vote".into())),
        }
      }
      _ => {
        let body: CastResponse = Self::check("POST", "/vote", resp)?.json().await?;
        Ok(Submission::Accepted(body.vote))
      }
    }
  }

  /// `GET /api/votes/mine`
  pub async fn my_votes(&self) -> Result<Vec<VoteRecord>> {
    let resp = self.auth(self.client.get(self.api_url("/votes/mine"))).send().await?;
    Ok(Self::check("GET", "/votes/mine", resp)?.json().await?)
  }

  /// `GET /api/votes/stats`
  pub async fn vote_stats(&self) -> Result<VoteStats> {
    let resp = self.auth(self.client.get(self.api_url("/votes/stats"))).send().await?;
    Ok(Self::check("GET", "/votes/stats", resp)?.json().await?)
  }

  /// `POST /api/votes/sync`
  pub async fn sync_votes(&self) -> Result<SyncReport> {
    let resp = self.auth(self.client.post(self.api_url("/votes/sync"))).send().await?;
    Ok(Self::check("POST", "/votes/sync", resp)?.json().await?)
  }

  // ── Participants and accounts ─────────────────────────────────────────────

  /// `POST /api/participants`
  pub async fn enroll(&self) -> Result<Enrollment> {
    let resp = self.auth(self.client.post(self.api_url("/participants"))).send().await?;
    Ok(Self::check("POST", "/participants", resp)?.json().await?)
  }

  /// `DELETE /api/participants`
  pub async fn withdraw(&self) -> Result<Enrollment> {
    let resp = self.auth(self.client.delete(self.api_url("/participants"))).send().await?;
    Ok(Self::check("DELETE", "/participants", resp)?.json().await?)
  }

  /// `GET /api/me`
  pub async fn me(&self) -> Result<Identity> {
    let resp = self.auth(self.client.get(self.api_url("/me"))).send().await?;
    Ok(Self::check("GET", "/me", resp)?.json().await?)
  }

  /// `POST /register`
  pub async fn register(&self, username: &str, password: &str) -> Result<Registered> {
    let resp = self
      .client
      .post(self.url("/register"))
      .json(&RegisterBody { username, password })
      .send()
      .await?;
    Ok(Self::check("POST", "/register", resp)?.json().await?)
  }

  // ── Assets ────────────────────────────────────────────────────────────────

  /// `GET /assets/manifest.json`
  pub async fn fetch_manifest(&self) -> Result<Vec<String>> {
    let resp = self.client.get(self.url("/assets/manifest.json")).send().await?;
    Ok(Self::check("GET", "/assets/manifest.json", resp)?.json().await?)
  }

  /// `HEAD <url>`; `true` on any 2xx. Relative paths are resolved against
  /// the base URL.
  pub async fn head_ok(&self, url: &str) -> bool {
    let url = if url.starts_with('/') { self.url(url) } else { url.to_owned() };
    match self.client.head(&url).send().await {
      Ok(resp) => resp.status().is_success(),
      Err(_) => false,
    }
  }
}
