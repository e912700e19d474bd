//! Environment variable handling.
//!
//! Standard toolchain variables (`CC`, `CXX`, `CFLAGS`, ...) are honoured
//! the way `make` and setuptools honour them; `EXTFORGE_*` variables
//! override the config file.

use std::env;

// Boolean variables accept "1", "true", "yes" (case-insensitive)
fn is_enabled(var: &str) -> bool {
    env::var(var).ok().is_some_and(|s| parse_bool(&s))
}

fn parse_bool(value: &str) -> bool {
    let s = value.trim().to_lowercase();
    s == "1" || s == "true" || s == "yes"
}

// Non-empty value or nothing
fn non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|s| !s.trim().is_empty())
}

/// Split a flags variable (`CFLAGS="-O2 -g"`) into separate arguments.
pub fn split_flags(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

// Build tool configuration
// CC, CXX, CFLAGS, CXXFLAGS, LDFLAGS

/// Get C compiler (useful for cross-compilation).
pub fn cc() -> Option<String> {
    non_empty("CC")
}

/// Get C++ compiler (useful for cross-compilation).
pub fn cxx() -> Option<String> {
    non_empty("CXX")
}

/// Get C compiler flags, split into arguments.
pub fn cflags() -> Vec<String> {
    non_empty("CFLAGS").map(|s| split_flags(&s)).unwrap_or_default()
}

/// Get C++ compiler flags, split into arguments.
pub fn cxxflags() -> Vec<String> {
    non_empty("CXXFLAGS")
        .map(|s| split_flags(&s))
        .unwrap_or_default()
}

/// Get linker flags, split into arguments.
pub fn ldflags() -> Vec<String> {
    non_empty("LDFLAGS").map(|s| split_flags(&s)).unwrap_or_default()
}

// Host runtime and binding library

/// Python interpreter to probe (`PYTHON`).
pub fn python() -> Option<String> {
    non_empty("PYTHON")
}

/// Known pybind11 header directory, skips asking the interpreter.
pub fn pybind11_include() -> Option<String> {
    non_empty("PYBIND11_INCLUDE")
}

/// Host runtime header directory (`EXTFORGE_PYTHON_INCLUDE`).
pub fn python_include() -> Option<String> {
    non_empty("EXTFORGE_PYTHON_INCLUDE")
}

/// Extension module filename suffix (`EXTFORGE_EXT_SUFFIX`), e.g. `.cpython-312-x86_64-linux-gnu.so`.
pub fn ext_suffix() -> Option<String> {
    non_empty("EXTFORGE_EXT_SUFFIX")
}

// extforge settings

/// Manifest path (`EXTFORGE_MANIFEST`).
pub fn manifest() -> Option<String> {
    non_empty("EXTFORGE_MANIFEST")
}

/// Build directory (`EXTFORGE_BUILD_DIR`).
pub fn build_dir() -> Option<String> {
    non_empty("EXTFORGE_BUILD_DIR")
}

/// Number of parallel compile jobs (returns None if not set or invalid).
pub fn jobs() -> Option<usize> {
    env::var("EXTFORGE_JOBS")
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .filter(|&n| n > 0)
}

/// Debug output requested through the environment (`EXTFORGE_DEBUG`).
pub fn extforge_debug() -> bool {
    is_enabled("EXTFORGE_DEBUG")
}

/// Skip config files entirely (`EXTFORGE_IGNORE_CONFIG`).
pub fn ignore_config() -> bool {
    is_enabled("EXTFORGE_IGNORE_CONFIG")
}
