//! Asset resolution: bind a logical entity to the best available image URL.
//!
//! The order is fixed: a data URI is used verbatim, then a loadable literal
//! hint, then the best-scoring manifest entry, then any loadable manifest
//! entry in manifest order, then the placeholder. Nothing here returns an
//! error; every failure degrades to the next step.

use fer_core::{
  asset::{self, PLACEHOLDER},
  candidate::Candidate,
};
use tracing::debug;

use crate::{
  client::ApiClient,
  local::{self, LocalStorage},
};

// ─── Seams ────────────────────────────────────────────────────────────────────

/// Tells whether an image URL can be loaded.
pub trait Probe: Send + Sync {
  async fn can_load(&self, url: &str) -> bool;
}

/// Supplies the asset manifest. `None` means it could not be fetched.
pub trait ManifestSource: Send + Sync {
  async fn fetch(&self) -> Option<Vec<String>>;
}

/// Probe by issuing `HEAD` requests against the server.
#[derive(Clone)]
pub struct HttpProbe {
  client: ApiClient,
}

impl HttpProbe {
  pub fn new(client: ApiClient) -> Self { Self { client } }
}

impl Probe for HttpProbe {
  async fn can_load(&self, url: &str) -> bool { self.client.head_ok(url).await }
}

impl ManifestSource for ApiClient {
  async fn fetch(&self) -> Option<Vec<String>> {
    match self.fetch_manifest().await {
      Ok(manifest) => Some(manifest),
      Err(e) => {
        debug!(error = %e, "asset manifest unavailable");
        None
      }
    }
  }
}

// ─── Encoding ─────────────────────────────────────────────────────────────────

/// Percent-encode a path the way a browser would before requesting it.
///
/// URL structure characters and existing `%` escapes are left alone;
/// everything else outside the unreserved set is encoded as UTF-8 bytes.
pub fn encode_path(path: &str) -> String {
  const KEEP: &[u8] = b"-_.!~*'();/?:@&=+$,#%";
  let mut out = String::with_capacity(path.len());
  for &b in path.as_bytes() {
    if b.is_ascii_alphanumeric() || KEEP.contains(&b) {
      out.push(b as char);
    } else {
      out.push_str(&format!("%{b:02X}"));
    }
  }
  out
}

// ─── Resolver ─────────────────────────────────────────────────────────────────

pub struct AssetResolver<P, M> {
  probe:       P,
  manifest:    M,
  placeholder: String,
}

impl<P: Probe, M: ManifestSource> AssetResolver<P, M> {
  pub fn new(probe: P, manifest: M) -> Self {
    Self { probe, manifest, placeholder: PLACEHOLDER.to_owned() }
  }

  pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
    self.placeholder = placeholder.into();
    self
  }

  /// Resolve `hint` and already-normalised `tokens` to an image URL.
  pub async fn resolve(&self, hint: Option<&str>, tokens: &[String]) -> String {
    let hint = hint.map(str::trim).filter(|h| !h.is_empty());

    if let Some(h) = hint {
      if asset::is_data_uri(h) {
        return h.to_owned();
      }
      let encoded = encode_path(h);
      if self.probe.can_load(&encoded).await {
        debug!(hint = h, "using literal hint");
        return encoded;
      }
    }

    let Some(manifest) = self.manifest.fetch().await else {
      let fallback = hint.map_or_else(|| self.placeholder.clone(), str::to_owned);
      debug!(%fallback, "no manifest; falling back");
      return fallback;
    };

    let best = asset::best_match(&manifest, tokens).map(|(path, _)| path);
    if let Some(path) = best {
      let encoded = encode_path(path);
      if self.probe.can_load(&encoded).await {
        debug!(path, "using best manifest match");
        return encoded;
      }
    }

    for path in manifest.iter().filter(|p| Some(p.as_str()) != best) {
      let encoded = encode_path(path);
      if self.probe.can_load(&encoded).await {
        debug!(path = %path, "using first loadable manifest entry");
        return encoded;
      }
    }

    self.placeholder.clone()
  }

  /// Resolve the portrait of a candidate, using its `photo` as the hint.
  pub async fn resolve_candidate(&self, candidate: &Candidate) -> String {
    let tokens = asset::identity_tokens(
      Some(&candidate.slug),
      Some(&candidate.name),
      candidate.photo.as_deref(),
    );
    self.resolve(candidate.photo.as_deref(), &tokens).await
  }

  /// Resolve the image of a page section. A locally stored override for the
  /// section is used as the hint.
  pub async fn resolve_section(&self, storage: &LocalStorage, section: &str) -> String {
    let hint: Option<String> = storage.get(&local::image_key(section)).ok().flatten();
    let tokens = asset::identity_tokens(None, Some(section), hint.as_deref());
    self.resolve(hint.as_deref(), &tokens).await
  }
}
