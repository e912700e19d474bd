//! Build plans
//!
//! A plan is the exact list of tool invocations that turns one descriptor
//! into a module: one compile per source, then one link. Plans are plain
//! data so they can be printed, compared in tests, or executed later.

use super::descriptor::ModuleDescriptor;
use super::host::HostRuntime;
use super::types::Language;
use crate::platform::ModuleFormat;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Compile one source into one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileStep {
    pub source: PathBuf,
    pub object: PathBuf,
    /// Full argument list passed to the compiler driver
    pub args: Vec<String>,
}

/// Link every object into the module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkStep {
    pub objects: Vec<PathBuf>,
    pub output: PathBuf,
    /// Full argument list passed to the compiler driver
    pub args: Vec<String>,
}

/// Everything needed to build one extension module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    pub module_name: String,
    pub language: Language,
    /// Compiler driver used for both compiling and linking
    pub compiler: String,
    /// Include directories that must exist before compiling
    pub include_dirs: Vec<PathBuf>,
    pub compile: Vec<CompileStep>,
    pub link: LinkStep,
    /// Where the finished module is written
    pub artifact: PathBuf,
}

/// Toolchain facts a plan is computed against
#[derive(Debug, Clone)]
pub struct PlanContext<'a> {
    pub host: &'a HostRuntime,
    /// Build root; objects go to `<build_dir>/temp`, modules to `<build_dir>/lib`
    pub build_dir: &'a Path,
    /// Compiler override; `CXX`/`CC` and the language default otherwise
    pub compiler: Option<&'a str>,
    pub format: ModuleFormat,
    /// Flags from `CFLAGS`/`CXXFLAGS`
    pub env_compile_flags: Vec<String>,
    /// Flags from `LDFLAGS`
    pub env_link_flags: Vec<String>,
}

impl<'a> PlanContext<'a> {
    /// Context reading compiler and flags from the environment
    #[must_use]
    pub fn from_env(
        host: &'a HostRuntime,
        build_dir: &'a Path,
        compiler: Option<&'a str>,
        language: Language,
    ) -> Self {
        let env_compile_flags = match language {
            Language::Cpp => crate::env_vars::cxxflags(),
            Language::C => crate::env_vars::cflags(),
        };

        Self {
            host,
            build_dir,
            compiler,
            format: crate::platform::current_format(),
            env_compile_flags,
            env_link_flags: crate::env_vars::ldflags(),
        }
    }

    fn compiler_for(&self, language: Language) -> String {
        if let Some(compiler) = self.compiler {
            return compiler.to_string();
        }
        let from_env = match language {
            Language::Cpp => crate::env_vars::cxx(),
            Language::C => crate::env_vars::cc(),
        };
        from_env.unwrap_or_else(|| language.default_compiler().to_string())
    }
}

impl BuildPlan {
    /// Plan the build of `module`.
    ///
    /// Compile arguments are ordered: platform flags, environment flags,
    /// macros, the module's include paths, the host headers, the module's
    /// own flags, then the source and output.
    #[must_use]
    pub fn for_module(module: &ModuleDescriptor, ctx: &PlanContext<'_>) -> Self {
        let language = module.language();
        let compiler = ctx.compiler_for(language);
        let temp_dir = ctx.build_dir.join("temp");

        let mut include_dirs = module.include_paths().to_vec();
        include_dirs.push(ctx.host.include_dir().to_path_buf());

        let mut shared = ctx.format.compile_args();
        shared.extend(ctx.env_compile_flags.iter().cloned());
        shared.extend(module.define_macros().iter().map(|(name, value)| {
            value
                .as_ref()
                .map_or_else(|| format!("-D{name}"), |value| format!("-D{name}={value}"))
        }));
        shared.extend(include_dirs.iter().map(|dir| format!("-I{}", dir.display())));
        shared.extend(module.compile_flags().iter().cloned());

        let compile: Vec<CompileStep> = module
            .source_files()
            .iter()
            .map(|source| {
                let object = object_path(&temp_dir, source, ctx.format);
                let mut args = vec!["-c".to_string()];
                args.extend(shared.iter().cloned());
                args.push(source.display().to_string());
                args.push("-o".to_string());
                args.push(object.display().to_string());
                CompileStep {
                    source: source.clone(),
                    object,
                    args,
                }
            })
            .collect();

        let artifact = ctx
            .build_dir
            .join("lib")
            .join(ctx.host.artifact_path(module.module_name()));
        let objects: Vec<PathBuf> = compile.iter().map(|step| step.object.clone()).collect();

        let link_options = module.link();
        let mut link_args: Vec<String> = objects.iter().map(|o| o.display().to_string()).collect();
        link_args.extend(ctx.format.link_args());
        link_args.extend(ctx.env_link_flags.iter().cloned());
        link_args.extend(
            link_options
                .library_dirs
                .iter()
                .map(|dir| format!("-L{}", dir.display())),
        );
        link_args.extend(link_options.libraries.iter().map(|lib| format!("-l{lib}")));
        link_args.extend(link_options.extra_link_args.iter().cloned());
        link_args.push("-o".to_string());
        link_args.push(artifact.display().to_string());

        Self {
            module_name: module.module_name().to_string(),
            language,
            compiler,
            include_dirs,
            compile,
            link: LinkStep {
                objects,
                output: artifact.clone(),
                args: link_args,
            },
            artifact,
        }
    }

    /// Artifact location relative to `root`, as `build_ext --inplace` places it
    #[must_use]
    pub fn inplace_target(&self, root: &Path) -> PathBuf {
        let relative = self
            .artifact
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_default();
        let mut segments: Vec<&str> = self.module_name.split('.').collect();
        segments.pop();
        let package_dir: PathBuf = segments.into_iter().collect();
        root.join(package_dir).join(relative)
    }
}

/// Object path for `source`: the source's directory tree mirrored under
/// `temp_dir`, with the object extension appended to the full file name
/// (`src/util.cpp` becomes `temp/src/util.cpp.o`).
fn object_path(temp_dir: &Path, source: &Path, format: ModuleFormat) -> PathBuf {
    let mut object = temp_dir.to_path_buf();
    for component in source.components() {
        match component {
            Component::Normal(part) => object.push(part),
            Component::ParentDir => object.push("__"),
            Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
        }
    }

    let mut file_name = object
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    file_name.push(".");
    file_name.push(format.object_extension());
    object.set_file_name(file_name);
    object
}
