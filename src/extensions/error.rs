//! Build errors
//!
//! Every failure carries the stage it came from so the CLI can tell a bad
//! descriptor apart from a compiler that rejected the sources.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Stage of an extension build at which a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Local checks on the descriptor, before any tool runs
    Validation,
    /// Looking up a binding library or the host runtime
    Dependency,
    /// Running the compiler over the sources
    Compilation,
    /// Linking objects into the extension module
    Linking,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validation => "descriptor validation",
            Self::Dependency => "dependency resolution",
            Self::Compilation => "compilation",
            Self::Linking => "linking",
        })
    }
}

/// Errors produced while describing, planning, or building an extension
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("{library} is not available: {reason}")]
    DependencyUnavailable { library: String, reason: String },

    #[error("failed to compile {}: {diagnostic}", source_file.display())]
    CompilationFailure {
        source_file: PathBuf,
        diagnostic: String,
    },

    #[error("failed to link: {diagnostic}")]
    LinkFailure { diagnostic: String },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    /// Stage that produced this error
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::InvalidDescriptor(_) => Stage::Validation,
            Self::DependencyUnavailable { .. } => Stage::Dependency,
            Self::CompilationFailure { .. } | Self::Io { .. } => Stage::Compilation,
            Self::LinkFailure { .. } => Stage::Linking,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidDescriptor(message.into())
    }

    pub(crate) fn unavailable(library: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DependencyUnavailable {
            library: library.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
