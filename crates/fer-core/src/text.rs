//! Text folding shared by slug generation and asset matching.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Decompose to NFD and drop combining marks, so `"Émilie"` becomes
/// `"Emilie"`. Ligatures common in French names are expanded.
pub fn strip_diacritics(input: &str) -> String {
  input
    .nfd()
    .filter(|c| !is_combining_mark(*c))
    .flat_map(|c| {
      let expanded: &[char] = match c {
        'œ' => &['o', 'e'],
        'Œ' => &['O', 'E'],
        'æ' => &['a', 'e'],
        'Æ' => &['A', 'E'],
        'ß' => &['s', 's'],
        _ => return vec![c],
      };
      expanded.to_vec()
    })
    .collect()
}

/// Build a URL-safe slug: diacritics stripped, lowercase ASCII alphanumerics,
/// runs of anything else collapsed to a single `-`, no leading/trailing `-`.
pub fn slugify(input: &str) -> String {
  let mut slug = String::with_capacity(input.len());
  let mut pending_dash = false;

  for c in strip_diacritics(input).chars() {
    if c.is_ascii_alphanumeric() {
      if pending_dash && !slug.is_empty() {
        slug.push('-');
      }
      pending_dash = false;
      slug.push(c.to_ascii_lowercase());
    } else {
      pending_dash = true;
    }
  }

  slug
}

/// `true` if `slug` is already in the form [`slugify`] produces.
pub fn is_valid_slug(slug: &str) -> bool {
  !slug.is_empty() && slugify(slug) == slug
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strips_accents_and_ligatures() {
    assert_eq!(strip_diacritics("Émilie Noël"), "Emilie Noel");
    assert_eq!(strip_diacritics("cœur"), "coeur");
  }

  #[test]
  fn slugify_collapses_separators() {
    assert_eq!(slugify("  Marie   Ngassa "), "marie-ngassa");
    assert_eq!(slugify("Hélène d'Arc -- 2025"), "helene-d-arc-2025");
    assert_eq!(slugify("!!!"), "");
  }

  #[test]
  fn slug_validity() {
    assert!(is_valid_slug("marie-ngassa"));
    assert!(!is_valid_slug("Marie Ngassa"));
    assert!(!is_valid_slug("-marie"));
    assert!(!is_valid_slug(""));
  }
}
