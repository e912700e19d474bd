//! Extension Builder Orchestration
//!
//! `register` hands a descriptor to an [`Orchestrator`], which plans and
//! runs the toolchain. [`ToolchainOrchestrator`] drives the system C/C++
//! compiler the way `python setup.py build_ext` does:
//! ```bash
//! c++ -c -fPIC -I<pybind11> -I<python> -std=c++20 src/module.cpp -o build/temp/src/module.cpp.o
//! c++ build/temp/src/module.cpp.o -shared -o build/lib/module.cpython-312-x86_64-linux-gnu.so
//! ```

use super::descriptor::ModuleDescriptor;
use super::error::BuildError;
use super::host::HostRuntime;
use super::plan::{BuildPlan, CompileStep, PlanContext};
use super::types::BuildOutput;
use crate::debug::format_command;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

/// Something that can turn a descriptor into a built module
pub trait Orchestrator {
    /// Work out the tool invocations for `module` without running anything
    fn plan(&self, module: &ModuleDescriptor) -> Result<BuildPlan, BuildError>;

    /// Run a plan to completion
    fn execute(&self, plan: &BuildPlan) -> Result<BuildOutput, BuildError>;
}

/// Submit a descriptor for building.
///
/// Plans the build, runs it, and returns the plan that was carried out.
/// Failures from the orchestrator are returned as they are, never retried.
///
/// # Errors
///
/// Whatever the orchestrator reports: usually
/// [`BuildError::CompilationFailure`] or [`BuildError::LinkFailure`].
pub fn register<O>(module: &ModuleDescriptor, orchestrator: &O) -> Result<BuildPlan, BuildError>
where
    O: Orchestrator + ?Sized,
{
    let plan = orchestrator.plan(module)?;
    let output = orchestrator.execute(&plan)?;
    crate::debug!(
        "built {} in {:?} -> {}",
        plan.module_name,
        output.duration,
        plan.artifact.display()
    );
    Ok(plan)
}

/// Orchestrator driving the system compiler
#[derive(Debug, Clone)]
pub struct ToolchainOrchestrator {
    /// Runtime the module is built for
    host: HostRuntime,
    /// Build root (`build/` by default)
    build_dir: PathBuf,
    /// Compiler override; `CXX`/`CC` or the language default otherwise
    compiler: Option<String>,
    /// Parallel compile jobs (rayon's default when unset)
    jobs: Option<usize>,
    /// Also copy the module here, as `build_ext --inplace` does
    inplace_root: Option<PathBuf>,
    /// Print each command and its output
    verbose: bool,
}

impl ToolchainOrchestrator {
    /// Create an orchestrator building for `host` under `build_dir`
    #[must_use]
    pub fn new(host: HostRuntime, build_dir: impl Into<PathBuf>) -> Self {
        Self {
            host,
            build_dir: build_dir.into(),
            compiler: None,
            jobs: None,
            inplace_root: None,
            verbose: false,
        }
    }

    #[must_use]
    pub fn with_compiler(mut self, compiler: Option<String>) -> Self {
        self.compiler = compiler;
        self
    }

    #[must_use]
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs.filter(|&n| n > 0);
        self
    }

    #[must_use]
    pub fn inplace(mut self, root: Option<PathBuf>) -> Self {
        self.inplace_root = root;
        self
    }

    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn host(&self) -> &HostRuntime {
        &self.host
    }

    #[must_use]
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Every source and include directory must exist before the compiler runs,
    /// and no two sources may share an object file
    fn check_inputs(plan: &BuildPlan) -> Result<(), BuildError> {
        for step in &plan.compile {
            if !step.source.is_file() {
                return Err(BuildError::CompilationFailure {
                    source_file: step.source.clone(),
                    diagnostic: format!("{}: No such file or directory", step.source.display()),
                });
            }
        }

        let mut objects = HashSet::new();
        for step in &plan.compile {
            if !objects.insert(&step.object) {
                return Err(BuildError::CompilationFailure {
                    source_file: step.source.clone(),
                    diagnostic: format!(
                        "object {} would be written by more than one source",
                        step.object.display()
                    ),
                });
            }
        }

        for dir in &plan.include_dirs {
            if !dir.is_dir() {
                return Err(BuildError::CompilationFailure {
                    source_file: plan
                        .compile
                        .first()
                        .map(|step| step.source.clone())
                        .unwrap_or_default(),
                    diagnostic: format!("include directory not found: {}", dir.display()),
                });
            }
        }

        Ok(())
    }

    fn ensure_dir(dir: &Path) -> Result<(), BuildError> {
        std::fs::create_dir_all(dir).map_err(|e| BuildError::io(dir, e))
    }

    fn compile_one(&self, compiler: &str, step: &CompileStep) -> Result<String, BuildError> {
        if self.verbose {
            println!("  Running: {}", format_command(compiler, &step.args));
        } else {
            crate::debug!("{}", format_command(compiler, &step.args));
        }

        let output = Command::new(compiler)
            .args(&step.args)
            .output()
            .map_err(|e| BuildError::CompilationFailure {
                source_file: step.source.clone(),
                diagnostic: format!("failed to run {compiler}: {e}"),
            })?;

        let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
        log.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(BuildError::CompilationFailure {
                source_file: step.source.clone(),
                diagnostic: failure_diagnostic(compiler, output.status.code(), &log),
            });
        }

        Ok(log)
    }

    fn compile_all(&self, plan: &BuildPlan) -> Result<Vec<String>, BuildError> {
        let run = || {
            plan.compile
                .par_iter()
                .map(|step| self.compile_one(&plan.compiler, step))
                .collect::<Result<Vec<_>, _>>()
        };

        let Some(jobs) = self.jobs else {
            return run();
        };

        match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool.install(run),
            Err(e) => {
                crate::debug!("could not start {jobs} compile jobs ({e}), using default pool");
                run()
            }
        }
    }

    fn link(&self, plan: &BuildPlan) -> Result<String, BuildError> {
        if self.verbose {
            println!("  Running: {}", format_command(&plan.compiler, &plan.link.args));
        } else {
            crate::debug!("{}", format_command(&plan.compiler, &plan.link.args));
        }

        let output = Command::new(&plan.compiler)
            .args(&plan.link.args)
            .output()
            .map_err(|e| BuildError::LinkFailure {
                diagnostic: format!("failed to run {}: {e}", plan.compiler),
            })?;

        let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
        log.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(BuildError::LinkFailure {
                diagnostic: failure_diagnostic(&plan.compiler, output.status.code(), &log),
            });
        }

        Ok(log)
    }

    /// Copy the module next to the package sources
    fn copy_inplace(&self, plan: &BuildPlan, root: &Path) -> Result<String, BuildError> {
        let target = plan.inplace_target(root);
        if let Some(parent) = target.parent() {
            Self::ensure_dir(parent)?;
        }

        std::fs::copy(&plan.artifact, &target).map_err(|e| BuildError::io(&target, e))?;

        let message = format!(
            "copying {} -> {}\n",
            plan.artifact.display(),
            target.display()
        );
        if self.verbose {
            print!("  {message}");
        }
        Ok(message)
    }
}

impl Orchestrator for ToolchainOrchestrator {
    fn plan(&self, module: &ModuleDescriptor) -> Result<BuildPlan, BuildError> {
        let ctx = PlanContext::from_env(
            &self.host,
            &self.build_dir,
            self.compiler.as_deref(),
            module.language(),
        );
        Ok(BuildPlan::for_module(module, &ctx))
    }

    fn execute(&self, plan: &BuildPlan) -> Result<BuildOutput, BuildError> {
        let start_time = Instant::now();

        if self.verbose {
            println!("Building extension {}", plan.module_name);
        }

        Self::check_inputs(plan)?;

        Self::ensure_dir(&self.build_dir.join("temp"))?;
        for step in &plan.compile {
            if let Some(parent) = step.object.parent() {
                Self::ensure_dir(parent)?;
            }
        }
        if let Some(parent) = plan.artifact.parent() {
            Self::ensure_dir(parent)?;
        }

        let mut log = self.compile_all(plan)?.concat();
        log.push_str(&self.link(plan)?);

        if let Some(root) = &self.inplace_root {
            log.push_str(&self.copy_inplace(plan, root)?);
        }

        if self.verbose && !log.trim().is_empty() {
            println!("{}", log.trim_end());
        }

        Ok(BuildOutput {
            duration: start_time.elapsed(),
            log,
        })
    }
}

/// Tool output verbatim, or the exit status when the tool printed nothing
fn failure_diagnostic(tool: &str, code: Option<i32>, log: &str) -> String {
    let log = log.trim();
    if log.is_empty() {
        format!(
            "{tool} failed with exit code: {}",
            code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
        )
    } else {
        log.to_string()
    }
}
