//! Subcommand implementations

pub(crate) mod build;
pub(crate) mod check;
pub(crate) mod clean;
pub(crate) mod completion;
pub(crate) mod includes;
pub(crate) mod plan;

use anyhow::{Context, Result};
use extforge::extensions::{LibraryCache, library_for};
use extforge::{Config, HostRuntime, Manifest, Package};
use std::path::{Path, PathBuf};

/// Locate the manifest: explicit flag first, then discovery
pub(crate) fn manifest_path(flag: Option<&str>) -> PathBuf {
    flag.map_or_else(extforge::find_manifest, PathBuf::from)
}

/// Load the manifest and resolve it into a validated package
///
/// Each binding library is located once, however many extensions use it.
pub(crate) fn load_package(manifest: &Path, python: Option<&str>) -> Result<Package> {
    extforge::debug!("loading manifest {}", manifest.display());

    let mut libraries = LibraryCache::new(|name: &str| library_for(name, python));
    let package = Manifest::load(manifest)
        .with_context(|| format!("Invalid manifest {}", manifest.display()))?
        .into_package(|name| libraries.resolve(name))
        .with_context(|| format!("Invalid manifest {}", manifest.display()))?;

    Ok(package)
}

/// Host runtime facts known without asking an interpreter.
///
/// Each field is taken from the environment first, then the `[host]`
/// config table. An explicit `--python` flag always means probing.
fn known_host(
    config: &Config,
    python_flag: Option<&str>,
    env_include: Option<String>,
    env_suffix: Option<String>,
) -> Option<HostRuntime> {
    if python_flag.is_some() {
        return None;
    }

    let include_dir = env_include.or_else(|| config.host.include_dir.clone())?;
    let ext_suffix = env_suffix.or_else(|| config.host.ext_suffix.clone())?;
    Some(HostRuntime::fixed(include_dir, ext_suffix))
}

/// Host runtime from the environment and config, or by probing the interpreter
pub(crate) fn host_runtime(
    config: &Config,
    python_flag: Option<&str>,
    python: Option<&str>,
) -> Result<HostRuntime> {
    let known = known_host(
        config,
        python_flag,
        extforge::env_vars::python_include(),
        extforge::env_vars::ext_suffix(),
    );
    if let Some(host) = known {
        extforge::debug!(
            "host runtime: include {} suffix {}",
            host.include_dir().display(),
            host.ext_suffix()
        );
        return Ok(host);
    }

    HostRuntime::detect(python).context("Cannot determine the host runtime")
}

/// Build root, relative paths taken from the package root
pub(crate) fn build_root(config: &Config, flag: Option<&str>, package_root: &Path) -> PathBuf {
    let dir = config.resolve_build_dir(flag);
    if dir.is_relative() {
        package_root.join(dir)
    } else {
        dir
    }
}
