//! Host runtime detection
//!
//! Finds the Python interpreter the module is built for and asks it where
//! its embedding headers live and what extension modules must be named.
//! The equivalent of what setuptools reads from `sysconfig`:
//! ```bash
//! python3 -c "import sysconfig; print(sysconfig.get_paths()['include'])"
//! python3 -c "import sysconfig; print(sysconfig.get_config_var('EXT_SUFFIX'))"
//! ```

use super::error::BuildError;
use crate::platform;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Script printing the header directory and module suffix, one per line
const SYSCONFIG_PROBE: &str = "import sysconfig\n\
print(sysconfig.get_paths()['include'])\n\
print(sysconfig.get_config_var('EXT_SUFFIX') or '')";

/// The runtime that will load the built module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRuntime {
    /// Interpreter used for probes (None when everything was given up front)
    interpreter: Option<PathBuf>,
    /// Directory holding the runtime's embedding headers (`Python.h`)
    include_dir: PathBuf,
    /// Filename suffix the runtime's import system looks for
    ext_suffix: String,
}

impl HostRuntime {
    /// A host whose facts are already known.
    #[must_use]
    pub fn fixed(include_dir: impl Into<PathBuf>, ext_suffix: impl Into<String>) -> Self {
        Self {
            interpreter: None,
            include_dir: include_dir.into(),
            ext_suffix: ext_suffix.into(),
        }
    }

    /// Detect the host runtime.
    ///
    /// `EXTFORGE_PYTHON_INCLUDE` and `EXTFORGE_EXT_SUFFIX` win when both are
    /// set; otherwise the interpreter is located (see
    /// [`find_python_executable`]) and asked through `sysconfig`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::DependencyUnavailable`] if no interpreter can
    /// be found or it cannot answer the probe.
    pub fn detect(python: Option<&str>) -> Result<Self, BuildError> {
        if let (Some(include), Some(suffix)) = (
            crate::env_vars::python_include(),
            crate::env_vars::ext_suffix(),
        ) {
            crate::debug!("host runtime from environment: {include} ({suffix})");
            return Ok(Self::fixed(include, suffix));
        }

        let interpreter = find_python_executable(python)?;
        let answer = query_interpreter(&interpreter, SYSCONFIG_PROBE)
            .map_err(|reason| BuildError::unavailable("python", reason))?;

        let mut lines = answer.lines().map(str::trim);
        let include_dir = lines
            .next()
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| {
                BuildError::unavailable("python", "interpreter reported no include directory")
            })?;
        let ext_suffix = lines
            .next()
            .filter(|line| !line.is_empty())
            .map_or_else(
                || platform::current_format().fallback_suffix().to_string(),
                str::to_string,
            );

        // A partial override still applies on top of the probe
        let include_dir = crate::env_vars::python_include().map_or(include_dir, PathBuf::from);
        let ext_suffix = crate::env_vars::ext_suffix().unwrap_or(ext_suffix);

        crate::debug!(
            "host runtime {}: include {} suffix {ext_suffix}",
            interpreter.display(),
            include_dir.display()
        );

        Ok(Self {
            interpreter: Some(interpreter),
            include_dir,
            ext_suffix,
        })
    }

    #[must_use]
    pub fn interpreter(&self) -> Option<&Path> {
        self.interpreter.as_deref()
    }

    #[must_use]
    pub fn include_dir(&self) -> &Path {
        &self.include_dir
    }

    #[must_use]
    pub fn ext_suffix(&self) -> &str {
        &self.ext_suffix
    }

    /// Path of the built module relative to the output root.
    ///
    /// The dotted prefix of the module name becomes package directories:
    /// `pkg.curves` with suffix `.so` lands at `pkg/curves.so`.
    #[must_use]
    pub fn artifact_path(&self, module_name: &str) -> PathBuf {
        let mut segments: Vec<&str> = module_name.split('.').collect();
        let leaf = segments.pop().unwrap_or(module_name);

        let mut path: PathBuf = segments.into_iter().collect();
        path.push(format!("{leaf}{}", self.ext_suffix));
        path
    }
}

/// Find a Python interpreter
///
/// Priority order:
/// 1. explicit `python` argument (CLI flag or config)
/// 2. `PYTHON` environment variable
/// 3. `python3`, then `python`, in `PATH`
pub fn find_python_executable(python: Option<&str>) -> Result<PathBuf, BuildError> {
    if let Some(explicit) = python.map(str::to_string).or_else(crate::env_vars::python) {
        return Ok(PathBuf::from(explicit));
    }

    for candidate in ["python3", "python"] {
        if let Ok(output) = Command::new("which").arg(candidate).output()
            && output.status.success()
        {
            let path_str = String::from_utf8_lossy(&output.stdout);
            let path = PathBuf::from(path_str.trim());
            if path.exists() {
                return Ok(path);
            }
        }
    }

    Err(BuildError::unavailable(
        "python",
        "no interpreter found in PATH or PYTHON environment variable",
    ))
}

/// Run `code` with the interpreter and return its trimmed stdout.
///
/// Errors are the diagnostic to report: spawn failures, or stderr of a
/// script that exited non-zero.
pub(crate) fn query_interpreter(interpreter: &Path, code: &str) -> Result<String, String> {
    crate::debug!("probing {}", interpreter.display());

    let output = Command::new(interpreter)
        .args(["-c", code])
        .output()
        .map_err(|e| format!("failed to run {}: {e}", interpreter.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let last_line = stderr.lines().last().unwrap_or("").trim();
        return Err(format!(
            "{} exited with {}{}",
            interpreter.display(),
            output
                .status
                .code()
                .map_or_else(|| "a signal".to_string(), |c| format!("status {c}")),
            if last_line.is_empty() {
                String::new()
            } else {
                format!(": {last_line}")
            }
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
