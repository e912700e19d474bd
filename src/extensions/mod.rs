//! Native extension building
//!
//! Describes and compiles native extension modules: C or C++ sources built
//! against a binding library (pybind11) into a module the host runtime can
//! import, similar to what `python setup.py build_ext` does.
//!
//! The pieces, in the order a build uses them:
//! - [`describe_module`] validates and assembles a [`ModuleDescriptor`]
//! - [`resolve_include_dir`] asks a [`LibraryHandle`] for its headers
//! - [`HostRuntime`] knows the interpreter's headers and module suffix
//! - [`register`] plans and runs the build through an [`Orchestrator`]

pub mod builder;
pub mod descriptor;
pub mod error;
pub mod host;
pub mod include;
pub mod plan;
pub mod preflight;
pub mod types;

pub use builder::{Orchestrator, ToolchainOrchestrator, register};
pub use descriptor::{
    LinkOptions, ModuleDescriptor, Package, PackageMetadata, describe_module, validate_module_name,
};
pub use error::{BuildError, Stage};
pub use host::{HostRuntime, find_python_executable};
pub use include::{
    FixedLibrary, LibraryCache, LibraryHandle, Pybind11, library_for, resolve_include_dir,
};
pub use plan::{BuildPlan, CompileStep, LinkStep, PlanContext};
pub use preflight::{InitMismatch, check_init_symbol, find_module_init};
pub use types::{BuildOutput, Language};
