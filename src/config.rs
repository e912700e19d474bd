//! Configuration file management
//!
//! Reads extforge's TOML configuration from the project directory or the
//! user's config directory. Command-line flags and `EXTFORGE_*` variables
//! take precedence over anything set here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default build root
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Application configuration loaded from TOML files
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Build root (objects in `temp/`, modules in `lib/`)
    #[serde(default)]
    pub build_dir: Option<String>,

    /// Compiler driver used for every extension
    #[serde(default)]
    pub compiler: Option<String>,

    /// Python interpreter the modules are built for
    #[serde(default)]
    pub python: Option<String>,

    /// Parallel compile jobs per extension
    #[serde(default)]
    pub jobs: Option<usize>,

    /// Host runtime facts, to skip probing the interpreter
    #[serde(default)]
    pub host: HostConfig,
}

/// `[host]` table
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct HostConfig {
    /// Directory containing `Python.h`
    #[serde(default)]
    pub include_dir: Option<String>,

    /// Module filename suffix, e.g. `.cpython-312-x86_64-linux-gnu.so`
    #[serde(default)]
    pub ext_suffix: Option<String>,
}

impl Config {
    /// Load configuration from TOML files.
    /// Priority: ./.extforge.toml -> ~/.config/extforge/config.toml
    ///
    /// # Errors
    ///
    /// Returns an error if config file parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_with_options(None, crate::env_vars::ignore_config())
    }

    /// Load configuration with custom options.
    ///
    /// # Arguments
    /// * `custom_path` - Optional custom path to config file (overrides defaults)
    /// * `skip_rc` - If true, skip loading config files (return default config)
    ///
    /// # Errors
    ///
    /// Returns an error if an existing config file cannot be read or parsed.
    pub fn load_with_options(custom_path: Option<&str>, skip_rc: bool) -> Result<Self> {
        if skip_rc {
            return Ok(Self::default());
        }

        if let Some(path) = custom_path {
            return Self::load_from(path);
        }

        let local = Path::new(".extforge.toml");
        if local.exists() {
            return Self::load_from(local);
        }

        if let Some(config_dir) = Self::user_config_dir() {
            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                return Self::load_from(&config_path);
            }
        }

        Ok(Self::default())
    }

    fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        crate::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    fn user_config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg_config).join("extforge"));
        }

        dirs::home_dir().map(|home| home.join(".config").join("extforge"))
    }

    /// Build root: flag, then `EXTFORGE_BUILD_DIR`, then config, then `build`
    #[must_use]
    pub fn resolve_build_dir(&self, flag: Option<&str>) -> PathBuf {
        flag.map(str::to_string)
            .or_else(crate::env_vars::build_dir)
            .or_else(|| self.build_dir.clone())
            .map_or_else(|| PathBuf::from(DEFAULT_BUILD_DIR), PathBuf::from)
    }

    /// Compiler: flag, then config (`CXX`/`CC` are consulted per language later)
    #[must_use]
    pub fn resolve_compiler(&self, flag: Option<&str>) -> Option<String> {
        flag.map(str::to_string).or_else(|| self.compiler.clone())
    }

    /// Interpreter: flag, then `PYTHON`, then config
    #[must_use]
    pub fn resolve_python(&self, flag: Option<&str>) -> Option<String> {
        flag.map(str::to_string)
            .or_else(crate::env_vars::python)
            .or_else(|| self.python.clone())
    }

    /// Compile jobs: flag, then `EXTFORGE_JOBS`, then config
    #[must_use]
    pub fn resolve_jobs(&self, flag: Option<usize>) -> Option<usize> {
        flag.or_else(crate::env_vars::jobs).or(self.jobs)
    }
}
