//! Package manifest (`extforge.toml`) parsing.
//!
//! The manifest is the declarative form of a `setup(...)` call: package
//! metadata plus one `[[extension]]` table per native module.

use crate::extensions::{
    BuildError, Language, LinkOptions, ModuleDescriptor, Package, PackageMetadata,
    describe_module,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default manifest file name
pub const MANIFEST_FILE: &str = "extforge.toml";

/// Errors that can occur while loading a manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest at {path}: {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error(transparent)]
    Build(#[from] BuildError),
}

/// `[package]` table
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PackageSection {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
}

/// One `[[extension]]` table
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExtensionSection {
    /// Importable module name
    pub name: String,

    #[serde(default)]
    pub sources: Vec<PathBuf>,

    /// Plain include directories
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,

    /// Binding libraries whose headers are looked up (e.g. `pybind11`)
    #[serde(default)]
    pub include_libraries: Vec<String>,

    #[serde(default)]
    pub extra_compile_args: Vec<String>,

    /// `[["NAME", "VALUE"], ["NAME"]]`
    #[serde(default)]
    pub define_macros: Vec<Vec<String>>,

    #[serde(default)]
    pub libraries: Vec<String>,

    #[serde(default)]
    pub library_dirs: Vec<PathBuf>,

    #[serde(default)]
    pub extra_link_args: Vec<String>,

    /// Front end (`c++` when omitted)
    #[serde(default)]
    pub language: Option<String>,
}

/// A parsed manifest, before libraries are resolved
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    pub package: PackageSection,

    #[serde(default, rename = "extension")]
    pub extensions: Vec<ExtensionSection>,

    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub root: PathBuf,
}

impl Manifest {
    /// Load a manifest from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid manifest.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ManifestError::ReadError {
            path: path.display().to_string(),
            source,
        })?;

        let mut manifest = Self::parse(&content)?;
        manifest.root = crate::paths::package_root(path);
        Ok(manifest)
    }

    /// Parse manifest content; relative paths resolve against the current directory
    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        let mut manifest: Self = toml::from_str(content)?;
        manifest.root = PathBuf::from(".");
        Ok(manifest)
    }

    /// Turn the manifest into a validated package.
    ///
    /// `resolve_library` maps each `include_libraries` entry to a header
    /// directory, normally via [`crate::extensions::resolve_include_dir`].
    ///
    /// # Errors
    ///
    /// Returns an error if any extension is invalid or a library cannot be
    /// resolved.
    pub fn into_package<F>(self, mut resolve_library: F) -> Result<Package, ManifestError>
    where
        F: FnMut(&str) -> Result<PathBuf, BuildError>,
    {
        let mut modules = Vec::with_capacity(self.extensions.len());
        for extension in self.extensions {
            modules.push(extension.into_descriptor(&self.root, &mut resolve_library)?);
        }

        let metadata = PackageMetadata {
            name: self.package.name,
            version: self.package.version,
            description: self.package.description,
        };
        Ok(Package::new(metadata, modules)?)
    }
}

impl ExtensionSection {
    fn into_descriptor<F>(
        self,
        root: &Path,
        resolve_library: &mut F,
    ) -> Result<ModuleDescriptor, BuildError>
    where
        F: FnMut(&str) -> Result<PathBuf, BuildError>,
    {
        let language = match self.language.as_deref() {
            Some(language) => language.parse()?,
            None => Language::Cpp,
        };

        let define_macros = self
            .define_macros
            .into_iter()
            .map(|pair| parse_macro(&self.name, pair))
            .collect::<Result<Vec<_>, _>>()?;

        // Validate before any library lookup
        let module = describe_module(
            &self.name,
            self.sources,
            self.include_dirs,
            self.extra_compile_args,
            language,
        )?;

        let library_dirs = self
            .include_libraries
            .iter()
            .map(|library| resolve_library(library.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        let module = module
            .with_include_paths(library_dirs)
            .with_define_macros(define_macros)
            .with_link_options(LinkOptions {
                library_dirs: self.library_dirs,
                libraries: self.libraries,
                extra_link_args: self.extra_link_args,
            });

        Ok(module.rooted_at(root))
    }
}

fn parse_macro(module: &str, pair: Vec<String>) -> Result<(String, Option<String>), BuildError> {
    let mut parts = pair.into_iter();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), value, None) if !name.is_empty() => Ok((name, value)),
        _ => Err(BuildError::invalid(format!(
            "module '{module}': define_macros entries must be [\"NAME\"] or [\"NAME\", \"VALUE\"]"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DATA_DRIVEN: &str = r#"
[package]
name = "data_driven_module"
version = "1.0"
description = "Python package with C++ extension"

[[extension]]
name = "data_driven_module"
sources = ["src/data_driven_space_filling_curve.cpp"]
include_libraries = ["pybind11"]
extra_compile_args = ["-std=c++20"]
language = "c++"
"#;

    fn pybind(name: &str) -> Result<PathBuf, BuildError> {
        match name {
            "pybind11" => Ok(PathBuf::from("/site-packages/pybind11/include")),
            other => Err(BuildError::unavailable(other, "not installed")),
        }
    }

    #[test]
    fn parses_data_driven_manifest() {
        let manifest = Manifest::parse(DATA_DRIVEN).unwrap();
        assert_eq!(manifest.package.name, "data_driven_module");
        assert_eq!(manifest.package.version, "1.0");
        assert_eq!(manifest.extensions.len(), 1);

        let package = manifest.into_package(pybind).unwrap();
        let module = package.extension("data_driven_module").unwrap();
        assert_eq!(
            module.source_files(),
            [PathBuf::from("./src/data_driven_space_filling_curve.cpp")]
        );
        assert_eq!(
            module.include_paths(),
            [PathBuf::from("/site-packages/pybind11/include")]
        );
        assert_eq!(module.compile_flags(), ["-std=c++20"]);
        assert_eq!(module.language(), Language::Cpp);
        assert_eq!(package.metadata().description, "Python package with C++ extension");
    }

    #[test]
    fn load_resolves_paths_against_manifest_dir() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(MANIFEST_FILE);
        fs::write(
            &path,
            r#"
[package]
name = "curves"

[[extension]]
name = "curves.scan"
sources = ["scan_line.cpp"]
include_dirs = ["include"]
language = "c"
"#,
        )
        .unwrap();

        let package = Manifest::load(&path).unwrap().into_package(pybind).unwrap();
        let module = &package.extensions()[0];
        assert_eq!(module.source_files(), [temp.path().join("scan_line.cpp")]);
        assert_eq!(module.include_paths(), [temp.path().join("include")]);
        assert_eq!(module.language(), Language::C);
    }

    #[test]
    fn missing_library_is_dependency_error() {
        let manifest = Manifest::parse(
            r#"
[package]
name = "p"

[[extension]]
name = "m"
sources = ["m.cpp"]
include_libraries = ["nanobind"]
"#,
        )
        .unwrap();

        let err = manifest.into_package(pybind).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Build(BuildError::DependencyUnavailable { .. })
        ));
    }

    #[test]
    fn invalid_descriptor_reported_before_library_lookup() {
        for body in [
            "name = \"data-driven\"\nsources = [\"m.cpp\"]",
            "name = \"m\"",
        ] {
            let manifest = Manifest::parse(&format!(
                "[package]\nname = \"p\"\n\n[[extension]]\n{body}\ninclude_libraries = [\"pybind11\"]\n"
            ))
            .unwrap();

            let mut lookups = 0;
            let err = manifest
                .into_package(|name| {
                    lookups += 1;
                    Err(BuildError::unavailable(name, "not installed"))
                })
                .unwrap_err();

            assert!(
                matches!(err, ManifestError::Build(BuildError::InvalidDescriptor(_))),
                "{err}"
            );
            assert_eq!(lookups, 0);
        }
    }

    #[test]
    fn empty_sources_rejected() {
        let manifest = Manifest::parse(
            r#"
[package]
name = "p"

[[extension]]
name = "m"
"#,
        )
        .unwrap();

        let err = manifest.into_package(pybind).unwrap_err();
        assert!(err.to_string().contains("no source files"));
    }

    #[test]
    fn duplicate_modules_rejected() {
        let manifest = Manifest::parse(
            r#"
[package]
name = "p"

[[extension]]
name = "m"
sources = ["a.cpp"]

[[extension]]
name = "m"
sources = ["b.cpp"]
"#,
        )
        .unwrap();

        assert!(manifest.into_package(pybind).is_err());
    }

    #[test]
    fn macros_and_link_settings() {
        let manifest = Manifest::parse(
            r#"
[package]
name = "p"

[[extension]]
name = "m"
sources = ["m.cpp"]
define_macros = [["NDEBUG"], ["VERSION_INFO", "1.0"]]
libraries = ["m"]
library_dirs = ["lib"]
extra_link_args = ["-Wl,-rpath,$ORIGIN"]
"#,
        )
        .unwrap();

        let package = manifest.into_package(pybind).unwrap();
        let module = &package.extensions()[0];
        assert_eq!(
            module.define_macros(),
            [
                ("NDEBUG".to_string(), None),
                ("VERSION_INFO".to_string(), Some("1.0".to_string()))
            ]
        );
        assert_eq!(module.link().libraries, ["m"]);
        assert_eq!(module.link().library_dirs, [PathBuf::from("./lib")]);
        assert_eq!(module.link().extra_link_args, ["-Wl,-rpath,$ORIGIN"]);
    }

    #[test]
    fn malformed_macro_rejected() {
        let manifest = Manifest::parse(
            r#"
[package]
name = "p"

[[extension]]
name = "m"
sources = ["m.cpp"]
define_macros = [["A", "1", "extra"]]
"#,
        )
        .unwrap();

        assert!(manifest.into_package(pybind).is_err());
    }

    #[test]
    fn unknown_keys_rejected() {
        let result = Manifest::parse(
            r#"
[package]
name = "p"

[[extension]]
name = "m"
sources = ["m.cpp"]
extra_compile_flags = ["-O2"]
"#,
        );
        assert!(matches!(result, Err(ManifestError::ParseError(_))));
    }

    #[test]
    fn unreadable_manifest() {
        let err = Manifest::load("/nonexistent/extforge.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read manifest"));
    }
}
