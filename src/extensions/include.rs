//! Binding library header lookup
//!
//! Header-only binding libraries know where they are installed; pybind11
//! answers through `pybind11.get_include()`. Lookups go through a
//! [`LibraryHandle`] passed in by the caller so a fake handle can stand in
//! for an installed library.

use super::error::BuildError;
use super::host::{find_python_executable, query_interpreter};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

/// A library that can report its own header directory
pub trait LibraryHandle {
    /// Name used in diagnostics and manifests
    fn name(&self) -> &str;

    /// Header include directory, or `None` if the library is not installed
    fn include_dir(&self) -> Option<PathBuf>;
}

/// Ask a binding library where its headers are.
///
/// # Errors
///
/// Returns [`BuildError::DependencyUnavailable`] if the handle cannot report
/// a location.
pub fn resolve_include_dir(library: &dyn LibraryHandle) -> Result<PathBuf, BuildError> {
    match library.include_dir() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            crate::debug!("{} headers: {}", library.name(), dir.display());
            Ok(dir)
        }
        _ => Err(BuildError::unavailable(
            library.name(),
            "could not determine its include directory (is it installed?)",
        )),
    }
}

/// pybind11, located through the Python interpreter it is installed into
#[derive(Debug)]
pub struct Pybind11 {
    /// Interpreter to ask; resolved lazily on first lookup when `None`
    python: Option<String>,
    /// First answer, reused by every later lookup
    cached: OnceLock<Option<PathBuf>>,
}

impl Pybind11 {
    /// Handle asking `python` (or the default interpreter) for pybind11's headers
    #[must_use]
    pub fn new(python: Option<&str>) -> Self {
        Self {
            python: python.map(str::to_string),
            cached: OnceLock::new(),
        }
    }

    fn lookup(&self) -> Option<PathBuf> {
        if let Some(dir) = crate::env_vars::pybind11_include() {
            return Some(PathBuf::from(dir));
        }

        let interpreter = find_python_executable(self.python.as_deref()).ok()?;
        match query_interpreter(&interpreter, "import pybind11; print(pybind11.get_include())") {
            Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
            Ok(_) => None,
            Err(reason) => {
                crate::debug!("pybind11 lookup failed: {reason}");
                None
            }
        }
    }
}

impl LibraryHandle for Pybind11 {
    fn name(&self) -> &str {
        "pybind11"
    }

    fn include_dir(&self) -> Option<PathBuf> {
        self.cached.get_or_init(|| self.lookup()).clone()
    }
}

/// A library whose location is already known (or known to be missing)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedLibrary {
    name: String,
    include_dir: Option<PathBuf>,
}

impl FixedLibrary {
    #[must_use]
    pub fn new(name: impl Into<String>, include_dir: Option<PathBuf>) -> Self {
        Self {
            name: name.into(),
            include_dir,
        }
    }
}

impl LibraryHandle for FixedLibrary {
    fn name(&self) -> &str {
        &self.name
    }

    fn include_dir(&self) -> Option<PathBuf> {
        self.include_dir.clone()
    }
}

/// Map a library name from a manifest to a handle.
///
/// # Errors
///
/// Returns [`BuildError::DependencyUnavailable`] for libraries extforge does
/// not know how to locate.
pub fn library_for(name: &str, python: Option<&str>) -> Result<Box<dyn LibraryHandle>, BuildError> {
    match name.trim().to_lowercase().as_str() {
        "pybind11" => Ok(Box::new(Pybind11::new(python))),
        _ => Err(BuildError::unavailable(
            name,
            "unknown binding library (supported: pybind11)",
        )),
    }
}

/// Library handles created on first use and shared by later lookups,
/// so a library is located once per cache however many modules name it
pub struct LibraryCache<F> {
    make: F,
    handles: HashMap<String, Box<dyn LibraryHandle>>,
}

impl<F> LibraryCache<F>
where
    F: FnMut(&str) -> Result<Box<dyn LibraryHandle>, BuildError>,
{
    /// Cache creating handles with `make` (normally [`library_for`])
    pub fn new(make: F) -> Self {
        Self {
            make,
            handles: HashMap::new(),
        }
    }

    /// Header directory of the library called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::DependencyUnavailable`] if the library is
    /// unknown or cannot report a location.
    pub fn resolve(&mut self, name: &str) -> Result<PathBuf, BuildError> {
        let key = name.trim().to_lowercase();
        let handle = match self.handles.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert((self.make)(name)?),
        };
        resolve_include_dir(handle.as_ref())
    }
}

impl<F> fmt::Debug for LibraryCache<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryCache")
            .field("libraries", &self.handles.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;
    use super::*;
    use std::cell::Cell;

    /// Handle that counts how often it is asked
    struct CountingLibrary {
        calls: Cell<usize>,
        dir: Option<PathBuf>,
    }

    impl LibraryHandle for CountingLibrary {
        fn name(&self) -> &str {
            "counting"
        }

        fn include_dir(&self) -> Option<PathBuf> {
            self.calls.set(self.calls.get() + 1);
            self.dir.clone()
        }
    }

    #[test]
    fn resolves_reported_directory() {
        let lib = FixedLibrary::new("pybind11", Some(PathBuf::from("/site-packages/pybind11/include")));
        assert_eq!(
            resolve_include_dir(&lib).unwrap(),
            PathBuf::from("/site-packages/pybind11/include")
        );
    }

    #[test]
    fn missing_library_is_unavailable() {
        let lib = FixedLibrary::new("pybind11", None);
        let err = resolve_include_dir(&lib).unwrap_err();
        match err {
            BuildError::DependencyUnavailable { library, .. } => assert_eq!(library, "pybind11"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_location_is_unavailable() {
        let lib = FixedLibrary::new("pybind11", Some(PathBuf::new()));
        assert!(resolve_include_dir(&lib).is_err());
    }

    #[test]
    fn resolution_is_idempotent() {
        let lib = CountingLibrary {
            calls: Cell::new(0),
            dir: Some(PathBuf::from("/inc")),
        };
        let first = resolve_include_dir(&lib).unwrap();
        let second = resolve_include_dir(&lib).unwrap();
        assert_eq!(first, second);
        assert_eq!(lib.calls.get(), 2);
    }

    #[test]
    fn pybind11_answer_is_cached() {
        let lib = Pybind11::new(Some("/nonexistent/bin/python-extforge"));
        let first = lib.include_dir();
        let second = lib.include_dir();
        assert_eq!(first, second);
        assert!(lib.cached.get().is_some());
    }

    #[test]
    fn unknown_library_name() {
        assert!(library_for("pybind11", None).is_ok());
        assert!(library_for("PyBind11", None).is_ok());
        let err = library_for("nanobind", None).err().unwrap();
        assert!(err.to_string().contains("nanobind"));
    }

    #[test]
    fn cache_creates_each_library_once() {
        let created = Rc::new(Cell::new(0));
        let lookups = Rc::new(Cell::new(0));
        let (created_in, lookups_in) = (Rc::clone(&created), Rc::clone(&lookups));
        let mut cache = LibraryCache::new(move |name: &str| {
            created_in.set(created_in.get() + 1);
            let handle: Box<dyn LibraryHandle> = Box::new(CountedOnce {
                name: name.to_string(),
                lookups: Rc::clone(&lookups_in),
                answer: OnceLock::new(),
            });
            Ok(handle)
        });

        let first = cache.resolve("pybind11").unwrap();
        let second = cache.resolve("PyBind11").unwrap();
        let third = cache.resolve("pybind11").unwrap();

        assert_eq!(first, PathBuf::from("/site-packages/pybind11/include"));
        assert_eq!(first, second);
        assert_eq!(second, third);
        assert_eq!(created.get(), 1);
        assert_eq!(lookups.get(), 1);
    }

    #[test]
    fn cache_does_not_keep_failures() {
        let attempts = Rc::new(Cell::new(0));
        let attempts_in = Rc::clone(&attempts);
        let mut cache = LibraryCache::new(move |name: &str| {
            attempts_in.set(attempts_in.get() + 1);
            library_for(name, None)
        });

        assert!(cache.resolve("nanobind").is_err());
        assert!(cache.resolve("nanobind").is_err());
        assert_eq!(attempts.get(), 2);
    }

    /// Handle that locates itself once, the way `Pybind11` does
    struct CountedOnce {
        name: String,
        lookups: Rc<Cell<usize>>,
        answer: OnceLock<Option<PathBuf>>,
    }

    impl LibraryHandle for CountedOnce {
        fn name(&self) -> &str {
            &self.name
        }

        fn include_dir(&self) -> Option<PathBuf> {
            self.answer
                .get_or_init(|| {
                    self.lookups.set(self.lookups.get() + 1);
                    Some(PathBuf::from("/site-packages/pybind11/include"))
                })
                .clone()
        }
    }
}
