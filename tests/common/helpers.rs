//! Shared test helpers and utilities

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Source defining the init symbol for `data_driven_module`
#[allow(dead_code)]
pub(crate) const DATA_DRIVEN_SOURCE: &str = r#"#include <pybind11/pybind11.h>

namespace py = pybind11;

PYBIND11_MODULE(data_driven_module, m) {
    m.doc() = "Data Driven Traversal Module";
}
"#;

/// `extforge` command isolated from the caller's config and environment
///
/// Probes are short-circuited: pybind11 and the host headers point into
/// `fixture`, and modules get a plain `.so` suffix.
#[allow(dead_code)]
pub(crate) fn extforge_command(fixture: &Fixture) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_extforge"));
    cmd.current_dir(fixture.root())
        .env("EXTFORGE_IGNORE_CONFIG", "1")
        .env("PYBIND11_INCLUDE", fixture.pybind11_include())
        .env("EXTFORGE_PYTHON_INCLUDE", fixture.python_include())
        .env("EXTFORGE_EXT_SUFFIX", ".so")
        .env_remove("EXTFORGE_MANIFEST")
        .env_remove("EXTFORGE_BUILD_DIR")
        .env_remove("EXTFORGE_DEBUG");
    cmd
}

/// A package directory with header directories standing in for pybind11
/// and the Python headers
pub(crate) struct Fixture {
    dir: TempDir,
}

#[allow(dead_code)]
impl Fixture {
    pub(crate) fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(dir.path().join("deps/pybind11/include"))
            .expect("Failed to create pybind11 include dir");
        fs::create_dir_all(dir.path().join("deps/python/include"))
            .expect("Failed to create python include dir");
        Self { dir }
    }

    pub(crate) fn root(&self) -> &Path {
        self.dir.path()
    }

    pub(crate) fn pybind11_include(&self) -> PathBuf {
        self.root().join("deps/pybind11/include")
    }

    pub(crate) fn python_include(&self) -> PathBuf {
        self.root().join("deps/python/include")
    }

    pub(crate) fn manifest(&self) -> PathBuf {
        self.root().join("extforge.toml")
    }

    /// Write `extforge.toml` with one extension
    pub(crate) fn write_manifest(&self, module: &str, sources: &[&str], extra: &str) {
        let sources = sources
            .iter()
            .map(|s| format!("\"{s}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let content = format!(
            r#"[package]
name = "data_driven_module"
version = "1.0"
description = "Python package with C++ extension"

[[extension]]
name = "{module}"
sources = [{sources}]
include_libraries = ["pybind11"]
extra_compile_args = ["-std=c++20"]
language = "c++"
{extra}"#
        );
        fs::write(self.manifest(), content).expect("Failed to write manifest");
    }

    /// Write a file relative to the package root
    pub(crate) fn write_source(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create source dir");
        }
        fs::write(&path, content).expect("Failed to write source");
        path
    }
}
