//! Build command
//!
//! Compile and link the extensions declared in the manifest

use anyhow::{Context, Result};
use extforge::extensions::check_init_symbol;
use extforge::{Config, ModuleDescriptor, Package, ToolchainOrchestrator, register};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;

/// Options for `extforge build`
#[derive(Debug, Default)]
pub(crate) struct BuildArgs {
    pub(crate) manifest: Option<String>,
    pub(crate) modules: Vec<String>,
    pub(crate) build_dir: Option<String>,
    pub(crate) inplace: bool,
    pub(crate) jobs: Option<usize>,
    pub(crate) compiler: Option<String>,
    pub(crate) python: Option<String>,
    pub(crate) verbose: bool,
}

/// Pick the modules named on the command line (all when none are named)
fn select_modules<'a>(package: &'a Package, names: &[String]) -> Result<Vec<&'a ModuleDescriptor>> {
    if names.is_empty() {
        return Ok(package.extensions().iter().collect());
    }

    names
        .iter()
        .map(|name| {
            package.extension(name).with_context(|| {
                format!(
                    "Module '{name}' is not declared in package '{}'",
                    package.metadata().name
                )
            })
        })
        .collect()
}

pub(crate) fn run(config: &Config, args: &BuildArgs) -> Result<()> {
    let start = Instant::now();
    let python = config.resolve_python(args.python.as_deref());
    let manifest = super::manifest_path(args.manifest.as_deref());
    let root = extforge::package_root(&manifest);

    let package = super::load_package(&manifest, python.as_deref())?;
    let modules = select_modules(&package, &args.modules)?;

    if modules.is_empty() {
        println!("No extensions declared in {}", manifest.display());
        return Ok(());
    }

    for module in &modules {
        for mismatch in check_init_symbol(module) {
            eprintln!(
                "warning: {} defines module '{}' but is built as '{}'",
                mismatch.source.display(),
                mismatch.found,
                mismatch.expected
            );
        }
    }

    let host = super::host_runtime(config, args.python.as_deref(), python.as_deref())?;
    let build_dir = super::build_root(config, args.build_dir.as_deref(), &root);
    let orchestrator = ToolchainOrchestrator::new(host, build_dir)
        .with_compiler(config.resolve_compiler(args.compiler.as_deref()))
        .with_jobs(config.resolve_jobs(args.jobs))
        .inplace(args.inplace.then(|| root.clone()))
        .verbose(args.verbose);

    let metadata = package.metadata();
    println!(
        "Building {} {} ({} extension{})",
        metadata.name,
        metadata.version,
        modules.len(),
        if modules.len() == 1 { "" } else { "s" }
    );

    let progress = (modules.len() > 1 && !args.verbose).then(|| {
        let pb = ProgressBar::new(modules.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    });

    let mut built = Vec::with_capacity(modules.len());
    for module in modules {
        if let Some(pb) = &progress {
            pb.set_message(module.module_name().to_string());
        }

        let result = register(module, &orchestrator);

        if let Some(pb) = &progress {
            pb.inc(1);
            if result.is_err() {
                pb.abandon();
            }
        }

        let plan = result
            .with_context(|| format!("Failed to build extension {}", module.module_name()))?;
        built.push(plan);
    }

    if let Some(pb) = progress {
        pb.finish_with_message("done");
    }

    for plan in &built {
        println!("  OK {} -> {}", plan.module_name, plan.artifact.display());
        if args.inplace {
            println!("     copied to {}", plan.inplace_target(&root).display());
        }
    }
    println!(
        "\nBuilt {} extension{} in {:.2}s",
        built.len(),
        if built.len() == 1 { "" } else { "s" },
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
