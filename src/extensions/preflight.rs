//! Preflight source checks
//!
//! The host runtime imports a module by calling `PyInit_<name>`, and
//! pybind11's `PYBIND11_MODULE(name, m)` macro generates that symbol. If the
//! name in the source differs from the descriptor's module name, the build
//! succeeds and the import fails later with a confusing error, so it is
//! checked before compiling.

use super::descriptor::ModuleDescriptor;
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

static INIT_SYMBOL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:PYBIND11_MODULE\s*\(\s*([A-Za-z_][A-Za-z0-9_]*)|(?:PyMODINIT_FUNC\s+)?PyInit_([A-Za-z_][A-Za-z0-9_]*)\s*\()")
        .ok()
});

/// A source defining the init symbol for a different module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitMismatch {
    pub source: PathBuf,
    /// Module name the descriptor expects
    pub expected: String,
    /// Module name found in the source
    pub found: String,
}

/// Module name defined by the first init symbol in `source_text`
#[must_use]
pub fn find_module_init(source_text: &str) -> Option<String> {
    let captures = INIT_SYMBOL.as_ref()?.captures(source_text)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|name| name.as_str().to_string())
}

/// Compare each readable source's init symbol with the module name.
///
/// Sources that cannot be read or define no init symbol are skipped; the
/// build reports missing files itself.
#[must_use]
pub fn check_init_symbol(module: &ModuleDescriptor) -> Vec<InitMismatch> {
    let expected = module.leaf_name();

    module
        .source_files()
        .iter()
        .filter_map(|source| {
            let text = std::fs::read_to_string(source).ok()?;
            let found = find_module_init(&text)?;
            crate::debug!("{} defines module init for {found}", source.display());
            (found != expected).then(|| InitMismatch {
                source: source.clone(),
                expected: expected.to_string(),
                found,
            })
        })
        .collect()
}
