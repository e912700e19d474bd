//! Plan command
//!
//! Show the compiler and linker invocations a build would run

use anyhow::{Context, Result};
use extforge::debug::format_command;
use extforge::{BuildPlan, Config, Orchestrator, ToolchainOrchestrator};

pub(crate) fn run(
    config: &Config,
    manifest: Option<&str>,
    build_dir: Option<&str>,
    compiler: Option<&str>,
    python_flag: Option<&str>,
    json: bool,
) -> Result<()> {
    let python = config.resolve_python(python_flag);
    let manifest = super::manifest_path(manifest);
    let root = extforge::package_root(&manifest);

    let package = super::load_package(&manifest, python.as_deref())?;
    let host = super::host_runtime(config, python_flag, python.as_deref())?;
    let orchestrator = ToolchainOrchestrator::new(host, super::build_root(config, build_dir, &root))
        .with_compiler(config.resolve_compiler(compiler));

    let plans = package
        .extensions()
        .iter()
        .map(|module| orchestrator.plan(module))
        .collect::<Result<Vec<_>, _>>()?;

    if json {
        let rendered =
            serde_json::to_string_pretty(&plans).context("Failed to serialize build plan")?;
        println!("{rendered}");
        return Ok(());
    }

    for plan in &plans {
        print!("{}", render(plan));
    }

    Ok(())
}

/// Human-readable plan: one shell line per tool invocation
fn render(plan: &BuildPlan) -> String {
    let mut out = format!("# {} ({})\n", plan.module_name, plan.language);
    for step in &plan.compile {
        out.push_str(&format_command(&plan.compiler, &step.args));
        out.push('\n');
    }
    out.push_str(&format_command(&plan.compiler, &plan.link.args));
    out.push('\n');
    out
}
