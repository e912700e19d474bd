//! extforge internal library code
//!
//! Describes native extension modules and builds them with the system
//! toolchain. The binary in `main.rs` is a thin CLI over this library.

pub mod config;
pub mod debug;
pub mod env_vars;
pub mod extensions;
pub mod manifest;
pub mod paths;
pub mod platform;

// Re-export common types for convenience
pub use config::{Config, HostConfig};
pub use debug::{init_debug, is_debug_enabled};
pub use extensions::{
    BuildError, BuildPlan, HostRuntime, Language, LibraryHandle, ModuleDescriptor, Orchestrator,
    Package, PackageMetadata, Stage, ToolchainOrchestrator, describe_module, register,
    resolve_include_dir,
};
pub use manifest::{MANIFEST_FILE, Manifest, ManifestError};
pub use paths::{find_manifest, find_manifest_in, package_root};
pub use platform::{ModuleFormat, current_format};

/// Stage of the first build error in an error chain, if any
#[must_use]
pub fn failing_stage(err: &anyhow::Error) -> Option<Stage> {
    err.chain().find_map(|cause| {
        cause
            .downcast_ref::<BuildError>()
            .map(BuildError::stage)
            .or_else(|| match cause.downcast_ref::<ManifestError>() {
                Some(ManifestError::Build(build)) => Some(build.stage()),
                Some(_) => Some(Stage::Validation),
                None => None,
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn stage_found_through_context() {
        let err = Err::<(), _>(BuildError::LinkFailure {
            diagnostic: "ld: symbol not found".to_string(),
        })
        .context("Failed to build data_driven_module")
        .unwrap_err();

        assert_eq!(failing_stage(&err), Some(Stage::Linking));
    }

    #[test]
    fn manifest_errors_are_validation() {
        let err = anyhow::Error::new(Manifest::parse("not toml [").unwrap_err());
        assert_eq!(failing_stage(&err), Some(Stage::Validation));
    }

    #[test]
    fn unrelated_errors_have_no_stage() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(failing_stage(&err), None);
    }
}
