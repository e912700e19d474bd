//! Extension build descriptors
//!
//! A descriptor is the immutable declaration of what to build: which
//! sources make up a module, where the compiler finds headers, which flags
//! it gets, and the name the host runtime imports the result under.
//! Building one never touches the filesystem or runs a tool; that happens
//! when the descriptor is registered with an orchestrator.

use super::error::BuildError;
use super::types::Language;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Linker inputs beyond the compiled objects
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkOptions {
    /// Directories searched for `libraries` (`-L`)
    pub library_dirs: Vec<PathBuf>,
    /// Libraries linked into the module (`-l`)
    pub libraries: Vec<String>,
    /// Arguments passed to the linker verbatim
    pub extra_link_args: Vec<String>,
}

/// Immutable declaration of one extension module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDescriptor {
    module_name: String,
    source_files: Vec<PathBuf>,
    include_paths: Vec<PathBuf>,
    compile_flags: Vec<String>,
    language: Language,
    define_macros: Vec<(String, Option<String>)>,
    link: LinkOptions,
}

/// Describe an extension module.
///
/// Pure data assembly: the sources and include directories are recorded as
/// given and only checked for existence when the module is built.
///
/// # Example
///
/// ```
/// use extforge::extensions::{Language, describe_module};
///
/// let module = describe_module(
///     "data_driven_module",
///     ["src/data_driven_space_filling_curve.cpp"],
///     ["/opt/pybind11/include"],
///     ["-std=c++20"],
///     Language::Cpp,
/// )
/// .unwrap();
///
/// assert_eq!(module.module_name(), "data_driven_module");
/// ```
///
/// # Errors
///
/// Returns [`BuildError::InvalidDescriptor`] if `name` is not an importable
/// module name or `sources` is empty.
pub fn describe_module<S, I, F>(
    name: &str,
    sources: S,
    include_dirs: I,
    flags: F,
    language: Language,
) -> Result<ModuleDescriptor, BuildError>
where
    S: IntoIterator,
    S::Item: Into<PathBuf>,
    I: IntoIterator,
    I::Item: Into<PathBuf>,
    F: IntoIterator,
    F::Item: Into<String>,
{
    validate_module_name(name)?;

    let source_files: Vec<PathBuf> = sources.into_iter().map(Into::into).collect();
    if source_files.is_empty() {
        return Err(BuildError::invalid(format!(
            "module '{name}' has no source files"
        )));
    }

    let mut seen = HashSet::new();
    let include_paths = include_dirs
        .into_iter()
        .map(Into::into)
        .filter(|dir: &PathBuf| seen.insert(dir.clone()))
        .collect();

    Ok(ModuleDescriptor {
        module_name: name.to_string(),
        source_files,
        include_paths,
        compile_flags: flags.into_iter().map(Into::into).collect(),
        language,
        define_macros: Vec::new(),
        link: LinkOptions::default(),
    })
}

/// Check that `name` can be imported by the host runtime.
///
/// Accepts dotted package paths (`pkg.sub.mod`); every segment must start
/// with an ASCII letter or underscore and continue with ASCII alphanumerics
/// or underscores.
pub fn validate_module_name(name: &str) -> Result<(), BuildError> {
    if name.is_empty() {
        return Err(BuildError::invalid("module name is empty"));
    }

    for segment in name.split('.') {
        if !is_identifier(segment) {
            return Err(BuildError::invalid(format!(
                "'{name}' is not a legal module name ('{segment}' is not an identifier)"
            )));
        }
    }

    Ok(())
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl ModuleDescriptor {
    /// Importable module name
    #[must_use]
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Last dotted segment of the module name (the init symbol suffix)
    #[must_use]
    pub fn leaf_name(&self) -> &str {
        self.module_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.module_name)
    }

    /// Native sources, in compilation order
    #[must_use]
    pub fn source_files(&self) -> &[PathBuf] {
        &self.source_files
    }

    /// Header search directories, in search order
    #[must_use]
    pub fn include_paths(&self) -> &[PathBuf] {
        &self.include_paths
    }

    /// Extra compiler options
    #[must_use]
    pub fn compile_flags(&self) -> &[String] {
        &self.compile_flags
    }

    /// Compiler front end
    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    /// Preprocessor definitions, `(NAME, VALUE)`
    #[must_use]
    pub fn define_macros(&self) -> &[(String, Option<String>)] {
        &self.define_macros
    }

    /// Linker inputs
    #[must_use]
    pub const fn link(&self) -> &LinkOptions {
        &self.link
    }

    /// Return a copy with preprocessor definitions added
    #[must_use]
    pub fn with_define_macros(
        mut self,
        macros: impl IntoIterator<Item = (String, Option<String>)>,
    ) -> Self {
        self.define_macros.extend(macros);
        self
    }

    /// Return a copy with the given linker inputs
    #[must_use]
    pub fn with_link_options(mut self, link: LinkOptions) -> Self {
        self.link = link;
        self
    }

    /// Return a copy with more header directories searched after the existing
    /// ones; directories already present are skipped
    #[must_use]
    pub fn with_include_paths(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        for dir in dirs {
            if !self.include_paths.contains(&dir) {
                self.include_paths.push(dir);
            }
        }
        self
    }

    /// Return a copy with every relative path resolved against `base`
    #[must_use]
    pub fn rooted_at(mut self, base: &Path) -> Self {
        let root = |path: PathBuf| {
            if path.is_relative() {
                base.join(path)
            } else {
                path
            }
        };
        self.source_files = self.source_files.into_iter().map(root).collect();
        self.include_paths = self.include_paths.into_iter().map(root).collect();
        self.link.library_dirs = self.link.library_dirs.into_iter().map(root).collect();
        self
    }
}

/// Descriptive package information, carried alongside the modules
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    pub description: String,
}

/// A distributable package: metadata plus its extension modules
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    metadata: PackageMetadata,
    extensions: Vec<ModuleDescriptor>,
}

impl Package {
    /// Assemble a package.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidDescriptor`] if the package name is empty
    /// or two modules share a name.
    pub fn new(
        metadata: PackageMetadata,
        extensions: Vec<ModuleDescriptor>,
    ) -> Result<Self, BuildError> {
        if metadata.name.trim().is_empty() {
            return Err(BuildError::invalid("package name is empty"));
        }

        let mut names = HashSet::new();
        for module in &extensions {
            if !names.insert(module.module_name()) {
                return Err(BuildError::invalid(format!(
                    "module '{}' is declared more than once in package '{}'",
                    module.module_name(),
                    metadata.name
                )));
            }
        }

        Ok(Self {
            metadata,
            extensions,
        })
    }

    #[must_use]
    pub const fn metadata(&self) -> &PackageMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn extensions(&self) -> &[ModuleDescriptor] {
        &self.extensions
    }

    /// Find a module by its importable name
    #[must_use]
    pub fn extension(&self, module_name: &str) -> Option<&ModuleDescriptor> {
        self.extensions
            .iter()
            .find(|module| module.module_name() == module_name)
    }
}
