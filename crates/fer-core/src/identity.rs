//! The acting identity, as supplied by the session layer.
//!
//! The core only reads `id` (to key ledger and enrollment lookups) and `role`
//! (to gate administrative registry mutations).

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  Member,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Admin => "admin",
      Self::Member => "member",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "admin" => Ok(Self::Admin),
      "member" => Ok(Self::Member),
      other => Err(Error::UnknownRole(other.to_owned())),
    }
  }
}

/// Read-only view of the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub id:   String,
  #[serde(default)]
  pub role: Option<Role>,
}

impl Identity {
  pub fn new(id: impl Into<String>, role: Option<Role>) -> Self {
    Self { id: id.into(), role }
  }

  pub fn is_admin(&self) -> bool { self.role == Some(Role::Admin) }
}

/// A registered account. The password hash never leaves the store crate
/// except through [`UserAccount`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub username:   String,
  pub role:       Role,
  pub created_at: DateTime<Utc>,
}

impl User {
  pub fn identity(&self) -> Identity {
    Identity::new(self.username.clone(), Some(self.role))
  }
}

/// A user together with the argon2 PHC string used to verify logins.
#[derive(Debug, Clone)]
pub struct UserAccount {
  pub user:          User,
  pub password_hash: String,
}
