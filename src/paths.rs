//! Manifest discovery.

use crate::env_vars;
use crate::manifest::MANIFEST_FILE;
use std::path::{Path, PathBuf};

/// Find the manifest for the current directory.
/// Priority: `EXTFORGE_MANIFEST` env var -> nearest `extforge.toml` walking up.
/// Defaults to `./extforge.toml` if none exists.
#[must_use]
pub fn find_manifest() -> PathBuf {
    if let Some(manifest) = env_vars::manifest() {
        return PathBuf::from(manifest);
    }

    find_manifest_in(".")
}

/// Find the nearest `extforge.toml` in `dir` or one of its ancestors.
/// Defaults to `dir/extforge.toml` if there is none.
#[must_use]
pub fn find_manifest_in(dir: impl AsRef<Path>) -> PathBuf {
    let dir = dir.as_ref();

    let start = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    for ancestor in start.ancestors() {
        let candidate = ancestor.join(MANIFEST_FILE);
        if candidate.is_file() {
            return candidate;
        }
    }

    dir.join(MANIFEST_FILE)
}

/// Directory the manifest lives in (the package root)
#[must_use]
pub fn package_root(manifest: &Path) -> PathBuf {
    manifest
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
