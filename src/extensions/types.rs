//! Extension type definitions
//!
//! Extension modules are compiled from a native systems language. This
//! module defines the compiler front ends we support and the record a
//! finished build leaves behind.

use super::error::BuildError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Compiler front end that processes an extension's sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// C++ (`c++`, `cpp`, `cxx`)
    Cpp,
    /// C (`c`)
    C,
}

impl Language {
    /// Default compiler driver for this language when `CXX`/`CC` are unset
    #[must_use]
    #[inline]
    pub const fn default_compiler(self) -> &'static str {
        match self {
            Self::Cpp => "c++",
            Self::C => "cc",
        }
    }

    /// Canonical spelling, as accepted in manifests
    #[must_use]
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cpp => "c++",
            Self::C => "c",
        }
    }
}

impl FromStr for Language {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "c++" | "cpp" | "cxx" => Ok(Self::Cpp),
            "c" => Ok(Self::C),
            other => Err(BuildError::invalid(format!(
                "unsupported language '{other}' (expected c++ or c)"
            ))),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running a build plan to completion
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    /// Wall time spent compiling and linking
    pub duration: Duration,

    /// Tool output (stdout + stderr), in the order tools ran
    pub log: String,
}
