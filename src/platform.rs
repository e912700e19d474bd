//! Platform conventions for loadable modules
//!
//! Which flags turn objects into something the host runtime can `dlopen`,
//! and what the file is called when the interpreter cannot tell us.

use std::env;
use std::sync::LazyLock;

/// How the linker is asked for a loadable module on this platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleFormat {
    /// ELF shared object (Linux, the BSDs)
    SharedObject,
    /// Mach-O bundle with symbols resolved at load time (macOS)
    Bundle,
    /// Windows DLL renamed to `.pyd`
    Dll,
}

/// Cached detection (computed once, reused throughout execution)
static CURRENT_FORMAT: LazyLock<ModuleFormat> = LazyLock::new(|| format_for_os(env::consts::OS));

/// Module format for the platform we are running on
#[must_use]
pub fn current_format() -> ModuleFormat {
    *CURRENT_FORMAT
}

fn format_for_os(os: &str) -> ModuleFormat {
    match os {
        "macos" | "ios" => ModuleFormat::Bundle,
        "windows" => ModuleFormat::Dll,
        _ => ModuleFormat::SharedObject,
    }
}

impl ModuleFormat {
    /// Compiler flags every object in a loadable module needs
    #[must_use]
    pub fn compile_args(self) -> Vec<String> {
        match self {
            Self::SharedObject | Self::Bundle => vec!["-fPIC".to_string()],
            Self::Dll => Vec::new(),
        }
    }

    /// Linker flags that produce a loadable module
    #[must_use]
    pub fn link_args(self) -> Vec<String> {
        match self {
            Self::SharedObject | Self::Dll => vec!["-shared".to_string()],
            Self::Bundle => vec![
                "-bundle".to_string(),
                "-undefined".to_string(),
                "dynamic_lookup".to_string(),
            ],
        }
    }

    /// Suffix used when the host runtime does not report one
    #[must_use]
    pub const fn fallback_suffix(self) -> &'static str {
        match self {
            Self::SharedObject | Self::Bundle => ".so",
            Self::Dll => ".pyd",
        }
    }

    /// Object file extension
    #[must_use]
    pub const fn object_extension(self) -> &'static str {
        match self {
            Self::SharedObject | Self::Bundle => "o",
            Self::Dll => "obj",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_by_os() {
        assert_eq!(format_for_os("linux"), ModuleFormat::SharedObject);
        assert_eq!(format_for_os("freebsd"), ModuleFormat::SharedObject);
        assert_eq!(format_for_os("macos"), ModuleFormat::Bundle);
        assert_eq!(format_for_os("windows"), ModuleFormat::Dll);
    }

    #[test]
    fn bundle_resolves_symbols_at_load_time() {
        let args = ModuleFormat::Bundle.link_args();
        assert!(args.contains(&"dynamic_lookup".to_string()));
        assert!(!args.contains(&"-shared".to_string()));
    }

    #[test]
    fn shared_objects_are_position_independent() {
        assert_eq!(ModuleFormat::SharedObject.compile_args(), vec!["-fPIC"]);
        assert_eq!(ModuleFormat::SharedObject.link_args(), vec!["-shared"]);
        assert_eq!(ModuleFormat::SharedObject.fallback_suffix(), ".so");
        assert_eq!(ModuleFormat::Dll.fallback_suffix(), ".pyd");
    }
}
