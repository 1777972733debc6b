//! Asset manifest generation.
//!
//! The manifest is the JSON array of public asset paths that clients use to
//! bind a candidate or section name to an image file. It is regenerated out
//! of band (`fer-server --generate-manifest`) and then served statically as
//! `/assets/manifest.json`.

use std::{
  fs, io,
  path::{Path, PathBuf},
};

/// File name of the manifest inside the asset directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// URL prefix the asset directory is mounted under.
pub const ASSET_PREFIX: &str = "/assets";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "svg", "avif"];

fn is_image(path: &Path) -> bool {
  path
    .extension()
    .and_then(|e| e.to_str())
    .is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
  for entry in fs::read_dir(dir)? {
    let entry = entry?;
    let path  = entry.path();
    let name  = entry.file_name();
    if name.to_string_lossy().starts_with('.') {
      continue;
    }
    if entry.file_type()?.is_dir() {
      walk(&path, out)?;
    } else if is_image(&path) {
      out.push(path);
    }
  }
  Ok(())
}

/// List the public URL paths of every image under `asset_dir`, sorted.
pub fn collect(asset_dir: &Path) -> io::Result<Vec<String>> {
  let mut files = Vec::new();
  walk(asset_dir, &mut files)?;

  let mut paths: Vec<String> = files
    .iter()
    .filter_map(|p| p.strip_prefix(asset_dir).ok())
    .map(|rel| {
      let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
      format!("{ASSET_PREFIX}/{}", parts.join("/"))
    })
    .collect();
  paths.sort();
  Ok(paths)
}

/// Regenerate `<asset_dir>/manifest.json`. Returns the number of entries.
pub fn generate(asset_dir: &Path) -> io::Result<usize> {
  let paths = collect(asset_dir)?;
  let json  = serde_json::to_string_pretty(&paths).map_err(io::Error::other)?;
  fs::write(asset_dir.join(MANIFEST_FILE), json)?;
  Ok(paths.len())
}
