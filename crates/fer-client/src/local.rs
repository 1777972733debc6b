//! Client-local persisted state.
//!
//! A flat key/value map of JSON values, optionally backed by a file that is
//! rewritten on every mutation. Nothing here is authoritative: it mirrors
//! server state for immediate UI feedback and holds the fallback candidate
//! list used when the backend is unreachable.

use std::{
  collections::BTreeMap,
  fs,
  path::{Path, PathBuf},
  sync::{Mutex, MutexGuard},
};

use fer_core::candidate::Category;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::StorageError;

// ─── Keys ─────────────────────────────────────────────────────────────────────

/// Fallback candidate list.
pub const CANDIDATES_KEY: &str = "fer_candidates";

const VOTE_PREFIX: &str = "fer_vote_";
const PARTICIPANT_PREFIX: &str = "fer_participant_";
const IMAGE_PREFIX: &str = "fer_image_";
const IDENTITY_PREFIX: &str = "fer_identity_";

/// Per-voter, per-category vote marker.
pub fn vote_key(voter_id: &str, category: Category) -> String {
  format!("{VOTE_PREFIX}{voter_id}_{category}")
}

/// Per-user, per-edition participant flag.
pub fn participant_key(voter_id: &str, edition: &str) -> String {
  format!("{PARTICIPANT_PREFIX}{voter_id}_{edition}")
}

/// Last identity the server confirmed for a username.
pub fn identity_key(username: &str) -> String { format!("{IDENTITY_PREFIX}{username}") }

/// Per-section image override.
pub fn image_key(section: &str) -> String { format!("{IMAGE_PREFIX}{section}") }

// ─── Storage ──────────────────────────────────────────────────────────────────

/// Key/value store of JSON values.
///
/// Writes go to a temporary sibling file first and are renamed into place,
/// so a crash never leaves a truncated state file.
#[derive(Debug)]
pub struct LocalStorage {
  path:    Option<PathBuf>,
  entries: Mutex<BTreeMap<String, Value>>,
}

impl LocalStorage {
  /// Storage that lives only as long as this value.
  pub fn in_memory() -> Self {
    Self { path: None, entries: Mutex::new(BTreeMap::new()) }
  }

  /// Load `path` if it exists, otherwise start empty. The file is created on
  /// the first write.
  pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
    let path = path.as_ref().to_path_buf();
    let entries = match fs::read_to_string(&path) {
      Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
      Ok(raw) => serde_json::from_str(&raw)?,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
      Err(e) => return Err(e.into()),
    };
    Ok(Self { path: Some(path), entries: Mutex::new(entries) })
  }

  fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Value>> {
    // A poisoned map is still a consistent map: every mutation is a single
    // insert or remove.
    self.entries.lock().unwrap_or_else(|e| e.into_inner())
  }

  fn persist(&self, entries: &BTreeMap<String, Value>) -> Result<(), StorageError> {
    let Some(path) = &self.path else {
      return Ok(());
    };
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
  }

  /// Read and decode `key`. `None` if absent.
  pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
    let entries = self.lock();
    entries
      .get(key)
      .map(|v| serde_json::from_value(v.clone()))
      .transpose()
      .map_err(StorageError::from)
  }

  pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
    let value = serde_json::to_value(value)?;
    let mut entries = self.lock();
    entries.insert(key.to_owned(), value);
    self.persist(&entries)
  }

  /// Returns `true` if the key was present.
  pub fn remove(&self, key: &str) -> Result<bool, StorageError> {
    let mut entries = self.lock();
    let existed = entries.remove(key).is_some();
    if existed {
      self.persist(&entries)?;
    }
    Ok(existed)
  }

  pub fn contains(&self, key: &str) -> bool { self.lock().contains_key(key) }
}
