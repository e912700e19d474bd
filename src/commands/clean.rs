//! Clean command
//!
//! Remove build output, like `setup.py clean`

use anyhow::{Context, Result};
use extforge::Config;
use std::fs;
use std::path::Path;

pub(crate) fn run(
    config: &Config,
    manifest: Option<&str>,
    build_dir: Option<&str>,
    all: bool,
) -> Result<()> {
    let manifest = super::manifest_path(manifest);
    let root = extforge::package_root(&manifest);
    let build_dir = super::build_root(config, build_dir, &root);

    let target = if all {
        build_dir
    } else {
        build_dir.join("temp")
    };

    if remove_dir(&target)? {
        println!("Removed {}", target.display());
    } else {
        println!("Nothing to clean at {}", target.display());
    }

    Ok(())
}

/// Remove `dir` if it exists; returns whether anything was removed
fn remove_dir(dir: &Path) -> Result<bool> {
    if !dir.exists() {
        return Ok(false);
    }

    fs::remove_dir_all(dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
    Ok(true)
}
