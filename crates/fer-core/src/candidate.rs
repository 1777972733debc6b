//! Contest candidates and the categories they compete in.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, text};

// ─── Category ────────────────────────────────────────────────────────────────

/// A contest track. A voter may cast exactly one vote per category.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
  Miss,
  Awards,
}

impl Category {
  pub const ALL: [Category; 2] = [Category::Miss, Category::Awards];

  /// The string stored in the `category` column and used in storage keys.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Miss => "miss",
      Self::Awards => "awards",
    }
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Category {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "miss" => Ok(Self::Miss),
      "awards" => Ok(Self::Awards),
      other => Err(Error::UnknownCategory(other.to_owned())),
    }
  }
}

// ─── Candidate ───────────────────────────────────────────────────────────────

/// A contest candidate as stored by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
  /// Registry-assigned; unique within one store.
  pub id:         i64,
  /// URL-safe and unique across the registry.
  pub slug:       String,
  pub name:       String,
  pub category:   Category,
  #[serde(default)]
  pub age:        Option<u32>,
  #[serde(default)]
  pub origin:     Option<String>,
  /// Field of activity, e.g. "entrepreneuriat".
  #[serde(default)]
  pub domain:     Option<String>,
  #[serde(default)]
  pub bio:        Option<String>,
  /// URL, asset path or logical name; resolved to an image at render time.
  #[serde(default)]
  pub photo:      Option<String>,
  #[serde(default)]
  pub votes:      u64,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
}

// ─── NewCandidate ────────────────────────────────────────────────────────────

/// Input to [`crate::store::ContestStore::create_candidate`].
/// `id`, `votes` and `created_at` are always assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCandidate {
  /// Derived from `name` when absent.
  #[serde(default)]
  pub slug:     Option<String>,
  pub name:     String,
  pub category: Category,
  #[serde(default)]
  pub age:      Option<u32>,
  #[serde(default)]
  pub origin:   Option<String>,
  #[serde(default)]
  pub domain:   Option<String>,
  #[serde(default)]
  pub bio:      Option<String>,
  #[serde(default)]
  pub photo:    Option<String>,
}

impl NewCandidate {
  /// Convenience constructor with all optional fields unset.
  pub fn new(name: impl Into<String>, category: Category) -> Self {
    Self {
      slug: None,
      name: name.into(),
      category,
      age: None,
      origin: None,
      domain: None,
      bio: None,
      photo: None,
    }
  }

  /// The slug this candidate will be stored under.
  ///
  /// Fails if the name is blank or the resulting slug would be empty.
  pub fn resolved_slug(&self) -> Result<String> {
    if self.name.trim().is_empty() {
      return Err(Error::InvalidCandidate("name must not be empty".into()));
    }
    let slug = match &self.slug {
      Some(s) if !s.trim().is_empty() => text::slugify(s),
      _ => text::slugify(&self.name),
    };
    if slug.is_empty() {
      return Err(Error::InvalidCandidate(format!(
        "cannot derive a slug from {:?}",
        self.name
      )));
    }
    Ok(slug)
  }

  /// Materialise into a [`Candidate`] with store-assigned fields.
  pub fn into_candidate(
    self,
    id: i64,
    created_at: DateTime<Utc>,
  ) -> Result<Candidate> {
    let slug = self.resolved_slug()?;
    Ok(Candidate {
      id,
      slug,
      name: self.name.trim().to_owned(),
      category: self.category,
      age: self.age,
      origin: self.origin,
      domain: self.domain,
      bio: self.bio,
      photo: self.photo,
      votes: 0,
      created_at: Some(created_at),
    })
  }
}

// ─── CandidateChanges ────────────────────────────────────────────────────────

/// A partial update. `None` leaves the field untouched.
///
/// `votes` is an administrative correction; normal tally changes go through
/// the vote ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateChanges {
  #[serde(default)]
  pub slug:     Option<String>,
  #[serde(default)]
  pub name:     Option<String>,
  #[serde(default)]
  pub category: Option<Category>,
  #[serde(default)]
  pub age:      Option<u32>,
  #[serde(default)]
  pub origin:   Option<String>,
  #[serde(default)]
  pub domain:   Option<String>,
  #[serde(default)]
  pub bio:      Option<String>,
  #[serde(default)]
  pub photo:    Option<String>,
  #[serde(default)]
  pub votes:    Option<u64>,
}

impl CandidateChanges {
  pub fn is_empty(&self) -> bool {
    self.slug.is_none()
      && self.name.is_none()
      && self.category.is_none()
      && self.age.is_none()
      && self.origin.is_none()
      && self.domain.is_none()
      && self.bio.is_none()
      && self.photo.is_none()
      && self.votes.is_none()
  }

  /// Apply the changes to `candidate` in place.
  ///
  /// A supplied slug is normalised with [`text::slugify`]; an empty result
  /// or a blank name is rejected and leaves `candidate` untouched.
  pub fn apply(&self, candidate: &mut Candidate) -> Result<()> {
    let slug = match &self.slug {
      Some(s) => {
        let slug = text::slugify(s);
        if slug.is_empty() {
          return Err(Error::InvalidCandidate(format!("invalid slug {s:?}")));
        }
        Some(slug)
      }
      None => None,
    };
    if let Some(name) = &self.name
      && name.trim().is_empty()
    {
      return Err(Error::InvalidCandidate("name must not be empty".into()));
    }

    if let Some(slug) = slug {
      candidate.slug = slug;
    }
    if let Some(name) = &self.name {
      candidate.name = name.trim().to_owned();
    }
    if let Some(category) = self.category {
      candidate.category = category;
    }
    if let Some(age) = self.age {
      candidate.age = Some(age);
    }
    if let Some(origin) = &self.origin {
      candidate.origin = Some(origin.clone());
    }
    if let Some(domain) = &self.domain {
      candidate.domain = Some(domain.clone());
    }
    if let Some(bio) = &self.bio {
      candidate.bio = Some(bio.clone());
    }
    if let Some(photo) = &self.photo {
      candidate.photo = Some(photo.clone());
    }
    if let Some(votes) = self.votes {
      candidate.votes = votes;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn category_parses_case_insensitively() {
    assert_eq!("Miss".parse::<Category>().unwrap(), Category::Miss);
    assert_eq!(" awards ".parse::<Category>().unwrap(), Category::Awards);
    assert!(matches!(
      "mister".parse::<Category>(),
      Err(Error::UnknownCategory(_))
    ));
  }

  #[test]
  fn slug_derived_from_name() {
    let c = NewCandidate::new("Marie Ngassa", Category::Miss);
    assert_eq!(c.resolved_slug().unwrap(), "marie-ngassa");
  }

  #[test]
  fn explicit_slug_is_normalised() {
    let mut c = NewCandidate::new("Marie Ngassa", Category::Miss);
    c.slug = Some("Marie N. 2025".into());
    assert_eq!(c.resolved_slug().unwrap(), "marie-n-2025");
  }

  #[test]
  fn blank_name_is_rejected() {
    let c = NewCandidate::new("   ", Category::Awards);
    assert!(matches!(c.resolved_slug(), Err(Error::InvalidCandidate(_))));
  }

  #[test]
  fn changes_apply_only_supplied_fields() {
    let mut cand = NewCandidate::new("Jordan", Category::Awards)
      .into_candidate(4, Utc::now())
      .unwrap();
    cand.bio = Some("before".into());

    let changes = CandidateChanges {
      origin: Some("Douala".into()),
      votes: Some(12),
      ..Default::default()
    };
    changes.apply(&mut cand).unwrap();

    assert_eq!(cand.origin.as_deref(), Some("Douala"));
    assert_eq!(cand.bio.as_deref(), Some("before"));
    assert_eq!(cand.votes, 12);
    assert_eq!(cand.slug, "jordan");
  }

  #[test]
  fn invalid_changes_leave_candidate_untouched() {
    let mut cand = NewCandidate::new("Jordan", Category::Awards)
      .into_candidate(4, Utc::now())
      .unwrap();
    let changes = CandidateChanges {
      slug: Some("---".into()),
      name: Some("Other".into()),
      ..Default::default()
    };
    assert!(changes.apply(&mut cand).is_err());
    assert_eq!(cand.name, "Jordan");
  }
}
