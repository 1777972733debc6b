//! Pure scoring for binding a logical name to an asset path.
//!
//! Matching works on normalised basenames: the file name without directory
//! and extension, diacritics stripped, non-alphanumerics removed, lowercased.
//! The I/O half of resolution (manifest fetch, load probes) lives in the
//! client crate.

use crate::text::strip_diacritics;

/// Returned when nothing can be resolved.
pub const PLACEHOLDER: &str = "/assets/placeholder.jpg";

/// Points for a token fully contained in a basename.
pub const FULL_MATCH: u32 = 2;
/// Points for a token whose first three characters appear in a basename.
pub const PREFIX_MATCH: u32 = 1;

const PREFIX_LEN: usize = 3;
const MIN_TOKEN_LEN: usize = 2;

/// Strip diacritics and non-alphanumerics, then lowercase.
pub fn normalize(input: &str) -> String {
  strip_diacritics(input)
    .chars()
    .filter(char::is_ascii_alphanumeric)
    .map(|c| c.to_ascii_lowercase())
    .collect()
}

/// The file name of `path` without directory, query string or extension.
pub fn stem(path: &str) -> &str {
  let path = path.split(['?', '#']).next().unwrap_or(path);
  let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
  match name.rfind('.') {
    Some(0) | None => name,
    Some(dot) => &name[..dot],
  }
}

/// Normalised basename of `path`.
pub fn normalized_stem(path: &str) -> String { normalize(stem(path)) }

pub fn is_data_uri(s: &str) -> bool {
  s.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("data:"))
}

/// Build the match tokens for an entity: the whole slug, the whole name and
/// each word of the name, and the basename of a literal hint. Tokens are
/// normalised and de-duplicated in first-seen order; tokens shorter than two
/// characters are dropped.
pub fn identity_tokens(
  slug: Option<&str>,
  name: Option<&str>,
  hint: Option<&str>,
) -> Vec<String> {
  let mut raw: Vec<String> = Vec::new();
  if let Some(slug) = slug {
    raw.push(normalize(slug));
  }
  if let Some(name) = name {
    raw.push(normalize(name));
    raw.extend(name.split_whitespace().map(normalize));
  }
  if let Some(hint) = hint.filter(|h| !is_data_uri(h)) {
    raw.push(normalized_stem(hint));
  }

  let mut tokens: Vec<String> = Vec::with_capacity(raw.len());
  for token in raw {
    if token.len() >= MIN_TOKEN_LEN && !tokens.contains(&token) {
      tokens.push(token);
    }
  }
  tokens
}

/// Score `path` against already-normalised `tokens`.
///
/// Each token contributes [`FULL_MATCH`] if the basename contains it, else
/// [`PREFIX_MATCH`] if the basename contains its first three characters.
pub fn score<S: AsRef<str>>(path: &str, tokens: &[S]) -> u32 {
  let base = normalized_stem(path);
  if base.is_empty() {
    return 0;
  }
  tokens.iter().map(|t| token_score(&base, t.as_ref())).sum()
}

fn token_score(base: &str, token: &str) -> u32 {
  if token.is_empty() {
    return 0;
  }
  if base.contains(token) {
    return FULL_MATCH;
  }
  let prefix: String = token.chars().take(PREFIX_LEN).collect();
  if prefix.chars().count() == PREFIX_LEN && base.contains(prefix.as_str()) {
    PREFIX_MATCH
  } else {
    0
  }
}

/// The highest-scoring manifest entry and its score.
///
/// Ties go to the entry that appears first. A best score of zero is no match.
pub fn best_match<'m, P, S>(manifest: &'m [P], tokens: &[S]) -> Option<(&'m str, u32)>
where
  P: AsRef<str>,
  S: AsRef<str>,
{
  let mut best: Option<(&'m str, u32)> = None;
  for entry in manifest {
    let path: &'m str = entry.as_ref();
    let s = score(path, tokens);
    if s > 0 && best.is_none_or(|(_, b)| s > b) {
      best = Some((path, s));
    }
  }
  best
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalize_folds_everything() {
    assert_eq!(normalize("Hélène-D'Arc_2"), "helenedarc2");
    assert_eq!(normalize("  "), "");
  }

  #[test]
  fn stem_drops_directory_extension_and_query() {
    assert_eq!(stem("/a/b/marie-ngassa.jpg"), "marie-ngassa");
    assert_eq!(stem("photo.final.png?v=2"), "photo.final");
    assert_eq!(stem("/a/.hidden"), ".hidden");
    assert_eq!(stem("noext"), "noext");
  }

  #[test]
  fn data_uri_detection() {
    assert!(is_data_uri("data:image/png;base64,AAAA"));
    assert!(is_data_uri("DATA:image/png;base64,AAAA"));
    assert!(!is_data_uri("/assets/data.png"));
  }

  #[test]
  fn tokens_are_normalised_and_deduplicated() {
    let tokens = identity_tokens(
      Some("marie-ngassa"),
      Some("Marie Ngassa"),
      Some("/img/Marie Ngassa.JPG"),
    );
    assert_eq!(tokens, vec!["mariengassa", "marie", "ngassa"]);
  }

  #[test]
  fn tokens_skip_short_words_and_data_uris() {
    let tokens =
      identity_tokens(None, Some("Jo de K"), Some("data:image/png;base64,xx"));
    assert_eq!(tokens, vec!["jodek", "jo", "de"]);
  }

  #[test]
  fn full_containment_beats_prefix() {
    assert_eq!(score("/a/marie-ngassa.jpg", &["mariengassa"]), FULL_MATCH);
    assert_eq!(score("/a/marion.jpg", &["mariengassa"]), PREFIX_MATCH);
    assert_eq!(score("/a/jordan.jpg", &["mariengassa"]), 0);
  }

  #[test]
  fn scores_sum_over_tokens() {
    assert_eq!(score("/a/marie-ngassa.jpg", &["marie", "ngassa"]), 4);
  }

  #[test]
  fn slug_picks_its_own_photo() {
    let manifest = ["/a/marie-ngassa.jpg", "/a/jordan.jpg"];
    let tokens = identity_tokens(Some("marie-ngassa"), None, None);
    assert_eq!(best_match(&manifest, &tokens), Some(("/a/marie-ngassa.jpg", 2)));
    assert_eq!(score("/a/jordan.jpg", &tokens), 0);
  }

  #[test]
  fn ties_go_to_first_occurrence() {
    let manifest = ["/x/clubs-1.jpg", "/y/clubs-2.jpg"];
    assert_eq!(best_match(&manifest, &["clubs"]), Some(("/x/clubs-1.jpg", 2)));
  }

  #[test]
  fn zero_score_is_no_match() {
    let manifest = ["/a/jordan.jpg"];
    assert_eq!(best_match(&manifest, &["clubs"]), None);
    let empty: [&str; 0] = [];
    assert_eq!(best_match(&empty, &["clubs"]), None);
  }
}
