//! `fer`: command-line client for the FER contest platform.
//!
//! # Usage
//!
//! ```text
//! fer --url http://localhost:8080 --user awa --password secret list
//! fer enroll
//! fer vote marie-ngassa
//! fer --config ~/.config/fer/config.toml stats
//! ```
//!
//! Vote markers, the participant flag, image overrides and the fallback
//! candidate list are kept in a local JSON state file (`--state`).

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use fer_client::{
  ClientError, VoteError,
  client::{ApiClient, ApiConfig},
  ledger::VoteLedger,
  local::{self, LocalStorage},
  registry::{CandidateRegistry, FallbackStore, RemoteStore},
  resolver::{AssetResolver, HttpProbe},
};
use fer_core::{
  asset,
  candidate::{Candidate, CandidateChanges, Category, NewCandidate},
  identity::Identity,
};
use serde::Deserialize;
use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "fer", version, about = "Command-line client for the FER contest platform")]
struct Args {
  /// Path to a TOML config file (url, username, password, state_file, edition).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the fer server (default: http://localhost:8080).
  #[arg(long, env = "FER_URL")]
  url: Option<String>,

  /// Account username.
  #[arg(long, env = "FER_USER")]
  user: Option<String>,

  /// Account password (plaintext).
  #[arg(long, env = "FER_PASSWORD")]
  password: Option<String>,

  /// Local state file (default: ~/.local/share/fer/state.json).
  #[arg(long, env = "FER_STATE", value_name = "FILE")]
  state: Option<PathBuf>,

  /// Contest edition the participant flag applies to.
  #[arg(long, env = "FER_EDITION")]
  edition: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List candidates.
  List {
    #[arg(long)]
    category: Option<Category>,
  },
  /// Show one candidate.
  Show { slug: String },
  /// Create a candidate (admin).
  Add {
    #[arg(long)]
    name:     String,
    #[arg(long)]
    category: Category,
    #[arg(long)]
    slug:     Option<String>,
    #[arg(long)]
    age:      Option<u32>,
    #[arg(long)]
    origin:   Option<String>,
    #[arg(long)]
    domain:   Option<String>,
    #[arg(long)]
    bio:      Option<String>,
    #[arg(long)]
    photo:    Option<String>,
  },
  /// Change fields of a candidate (admin).
  Edit {
    id:       i64,
    #[arg(long)]
    name:     Option<String>,
    #[arg(long)]
    category: Option<Category>,
    #[arg(long)]
    slug:     Option<String>,
    #[arg(long)]
    age:      Option<u32>,
    #[arg(long)]
    origin:   Option<String>,
    #[arg(long)]
    domain:   Option<String>,
    #[arg(long)]
    bio:      Option<String>,
    #[arg(long)]
    photo:    Option<String>,
  },
  /// Delete a candidate (admin).
  Remove { id: i64 },
  /// Create a member account.
  Register { username: String, password: String },
  /// Join the current edition.
  Enroll,
  /// Leave the current edition. Votes already cast stay recorded.
  Withdraw,
  /// Vote for a candidate.
  Vote { slug: String },
  /// Show enrollment and local vote markers.
  Status,
  /// Rewrite local vote markers from the server's records.
  RefreshMarkers,
  /// Forget all local vote markers.
  ClearMarkers,
  /// Stored tallies next to ledger counts (admin).
  Stats,
  /// Recompute stored tallies from the ledger (admin).
  Sync,
  /// Resolve an image URL for a candidate, a page section or raw tokens.
  Resolve {
    #[arg(long, conflicts_with = "section")]
    slug:    Option<String>,
    #[arg(long)]
    section: Option<String>,
    #[arg(long)]
    hint:    Option<String>,
    /// Extra match tokens.
    tokens:  Vec<String>,
  },
  /// Override the image of a page section.
  SetImage { section: String, path: String },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:        String,
  #[serde(default)]
  username:   String,
  #[serde(default)]
  password:   String,
  #[serde(default)]
  state_file: Option<PathBuf>,
  #[serde(default)]
  edition:    Option<String>,
}

fn non_empty(s: &str) -> Option<String> { (!s.is_empty()).then(|| s.to_owned()) }

fn default_state_file() -> PathBuf {
  match std::env::var_os("HOME") {
    Some(home) => PathBuf::from(home).join(".local/share/fer/state.json"),
    None => PathBuf::from("fer-state.json"),
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| non_empty(&file_cfg.url))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    username: args.user.or_else(|| non_empty(&file_cfg.username)).unwrap_or_default(),
    password: args
      .password
      .or_else(|| non_empty(&file_cfg.password))
      .unwrap_or_default(),
  };
  let state_path = args
    .state
    .or(file_cfg.state_file)
    .unwrap_or_else(default_state_file);
  let edition = args
    .edition
    .or(file_cfg.edition)
    .unwrap_or_else(|| "fer-2025".to_string());

  let client = ApiClient::new(api_config).context("failed to build HTTP client")?;
  let storage = Arc::new(
    LocalStorage::open(&state_path)
      .with_context(|| format!("opening state file {}", state_path.display()))?,
  );

  let app = App {
    registry: CandidateRegistry::new(
      RemoteStore::new(client.clone()),
      FallbackStore::new(storage.clone()),
    ),
    ledger: VoteLedger::new(client.clone(), storage.clone(), edition),
    resolver: AssetResolver::new(HttpProbe::new(client.clone()), client.clone()),
    client,
    storage,
  };
  app.run(args.command).await
}

// ─── Commands ─────────────────────────────────────────────────────────────────

struct App {
  client:   ApiClient,
  storage:  Arc<LocalStorage>,
  registry: CandidateRegistry<RemoteStore>,
  ledger:   VoteLedger<ApiClient>,
  resolver: AssetResolver<HttpProbe, ApiClient>,
}

impl App {
  async fn run(&self, command: Command) -> Result<()> {
    match command {
      Command::List { category } => {
        let list = self.registry.list().await?;
        for c in list.iter().filter(|c| category.is_none_or(|cat| c.category == cat)) {
          println!("{:>4}  {:<7} {:>6}  {:<24} {}", c.id, c.category, c.votes, c.slug, c.name);
        }
      }
      Command::Show { slug } => {
        let c = self.candidate(&slug).await?;
        print_candidate(&c);
        println!("image     {}", self.resolver.resolve_candidate(&c).await);
      }
      Command::Add { name, category, slug, age, origin, domain, bio, photo } => {
        let input = NewCandidate { slug, name, category, age, origin, domain, bio, photo };
        let who = self.session().await;
        let c = self.registry.create(who.as_ref(), input).await?;
        println!("created {} ({})", c.id, c.slug);
      }
      Command::Edit { id, name, category, slug, age, origin, domain, bio, photo } => {
        let changes = CandidateChanges {
          slug,
          name,
          category,
          age,
          origin,
          domain,
          bio,
          photo,
          votes: None,
        };
        if changes.is_empty() {
          bail!("nothing to change");
        }
        let who = self.session().await;
        let c = self.registry.update(who.as_ref(), id, changes).await?;
        print_candidate(&c);
      }
      Command::Remove { id } => {
        let who = self.session().await;
        self.registry.delete(who.as_ref(), id).await?;
        println!("deleted {id}");
      }
      Command::Register { username, password } => {
        let user = self.client.register(&username, &password).await?;
        println!("registered {} ({})", user.username, user.role);
      }
      Command::Enroll => {
        let who = self.session().await;
        self.ledger.enroll(who.as_ref()).await?;
        println!("enrolled in {}", self.ledger.edition());
      }
      Command::Withdraw => {
        let who = self.session().await;
        self.ledger.withdraw(who.as_ref()).await?;
        println!("withdrawn from {}", self.ledger.edition());
      }
      Command::Vote { slug } => {
        let mut c = self.candidate(&slug).await?;
        let who = self.session().await;
        match self.ledger.attempt_vote(who.as_ref(), &mut c).await {
          Ok(_) => println!("voted for {} ({} votes)", c.name, c.votes),
          Err(VoteError::AlreadyVoted { category, candidate_id, candidate_name }) => {
            let whom = match (candidate_name, candidate_id) {
              (Some(name), _) => name,
              (None, Some(id)) => format!("candidate {id}"),
              (None, None) => "another candidate".to_string(),
            };
            println!("already voted for {whom} in {category}");
          }
          Err(e) => return Err(e.into()),
        }
      }
      Command::Status => {
        let who = self.session().await.ok_or_else(|| anyhow!("log in to see your status"))?;
        let enrolled = self.ledger.is_enrolled(&who.id)?;
        println!("{} in {}: {}", who.id, self.ledger.edition(), if enrolled {
          "enrolled"
        } else {
          "not enrolled"
        });
        for category in Category::ALL {
          match self.ledger.voted_for(&who.id, category)? {
            Some(m) => println!(
              "  {category:<7} voted for {}",
              m.candidate_name.unwrap_or_else(|| format!("candidate {}", m.candidate_id))
            ),
            None => println!("  {category:<7} -"),
          }
        }
      }
      Command::RefreshMarkers => {
        let who = self.session().await.ok_or(VoteError::Unauthenticated)?;
        let n = self.ledger.refresh_markers(&who).await?;
        println!("{n} vote(s) on record");
      }
      Command::ClearMarkers => {
        let who = self.session().await.ok_or(VoteError::Unauthenticated)?;
        let n = self.ledger.clear_markers(&who.id)?;
        println!("cleared {n} marker(s)");
      }
      Command::Stats => {
        let stats = self.registry.stats().await?;
        println!("total votes: {}", stats.total_votes);
        for t in &stats.candidates {
          let flag = if t.is_drifted() { "  (drifted)" } else { "" };
          println!("{:>4}  {:>6} {:>6}  {}{flag}", t.id, t.votes, t.actual_votes, t.name);
        }
      }
      Command::Sync => {
        let report = self.registry.sync().await?;
        println!("updated {} candidate(s); {} votes", report.updated, report.stats.total_votes);
      }
      Command::Resolve { slug, section, hint, tokens } => {
        let url = if let Some(slug) = slug {
          let mut c = self.candidate(&slug).await?;
          if hint.is_some() {
            c.photo = hint;
          }
          self.resolver.resolve_candidate(&c).await
        } else if let Some(section) = section {
          self.resolver.resolve_section(&self.storage, &section).await
        } else {
          let tokens: Vec<String> = tokens
            .iter()
            .map(|t| asset::normalize(t))
            .filter(|t| !t.is_empty())
            .collect();
          self.resolver.resolve(hint.as_deref(), &tokens).await
        };
        println!("{url}");
      }
      Command::SetImage { section, path } => {
        self.storage.set(&local::image_key(&section), &path)?;
        println!("{section} → {path}");
      }
    }
    Ok(())
  }

  async fn candidate(&self, slug: &str) -> Result<Candidate> {
    self
      .registry
      .get_by_slug(slug)
      .await?
      .ok_or_else(|| anyhow!("no candidate with slug {slug:?}"))
  }

  /// The current identity, if credentials are configured.
  ///
  /// A confirmed identity is remembered locally; when the server cannot be
  /// reached the remembered one (or a role-less one) stands in.
  async fn session(&self) -> Option<Identity> {
    if !self.client.has_credentials() {
      return None;
    }
    let username = &self.client.config().username;
    let key = local::identity_key(username);
    match self.client.me().await {
      Ok(identity) => {
        if let Err(e) = self.storage.set(&key, &identity) {
          warn!(error = %e, "failed to remember identity");
        }
        Some(identity)
      }
      Err(ClientError::Unauthenticated) => {
        warn!("credentials rejected by server");
        None
      }
      Err(e) => {
        warn!(error = %e, "could not confirm identity; using remembered one");
        let remembered: Option<Identity> = self.storage.get(&key).ok().flatten();
        Some(remembered.unwrap_or_else(|| Identity::new(username.clone(), None)))
      }
    }
  }
}

fn print_candidate(c: &Candidate) {
  println!("id        {}", c.id);
  println!("slug      {}", c.slug);
  println!("name      {}", c.name);
  println!("category  {}", c.category);
  if let Some(age) = c.age {
    println!("age       {age}");
  }
  for (label, value) in [("origin", &c.origin), ("domain", &c.domain), ("bio", &c.bio)] {
    if let Some(v) = value {
      println!("{label:<9} {v}");
    }
  }
  println!("votes     {}", c.votes);
}
