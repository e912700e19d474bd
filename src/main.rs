//! extforge command-line interface
//!
//! Build native extension modules declared in `extforge.toml`

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::process;

/// Display an error with the stage that failed and its cause chain
fn display_error(err: &anyhow::Error, backtrace_enabled: bool) {
    match extforge::failing_stage(err) {
        Some(stage) => eprintln!("error: {stage}: {err}"),
        None => eprintln!("error: {err}"),
    }

    let mut source = err.source();
    while let Some(err) = source {
        eprintln!("caused by: {err}");
        source = err.source();
    }

    if backtrace_enabled {
        let backtrace = err.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            eprintln!("\nBacktrace:");
            eprintln!("{backtrace}");
        }
    }
}

#[derive(Parser)]
#[command(name = "extforge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build native extension modules from declarative descriptors", long_about = None)]
pub(crate) struct Cli {
    /// Print debug output (probes, command lines)
    #[arg(long, global = true)]
    debug: bool,

    /// Show a backtrace for errors (requires `RUST_BACKTRACE=1`)
    #[arg(long, global = true)]
    backtrace: bool,

    /// Path to a config file (defaults to ./.extforge.toml, then the user config)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Ignore config files
    #[arg(long, global = true)]
    no_config: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile and link every extension in the manifest
    Build {
        /// Path to extforge.toml
        #[arg(long, short)]
        manifest: Option<String>,

        /// Only build this module (repeatable)
        #[arg(long = "module")]
        modules: Vec<String>,

        /// Build root (objects in temp/, modules in lib/)
        #[arg(long)]
        build_dir: Option<String>,

        /// Also copy built modules next to the package sources
        #[arg(long, short)]
        inplace: bool,

        /// Number of parallel compile jobs
        #[arg(long, short = 'j')]
        jobs: Option<usize>,

        /// Compiler driver (overrides CXX/CC)
        #[arg(long)]
        compiler: Option<String>,

        /// Python interpreter the modules are built for
        #[arg(long)]
        python: Option<String>,

        /// Print each command and its output
        #[arg(long, short)]
        verbose: bool,
    },

    /// Print the commands a build would run, without running them
    Plan {
        /// Path to extforge.toml
        #[arg(long, short)]
        manifest: Option<String>,

        /// Build root (objects in temp/, modules in lib/)
        #[arg(long)]
        build_dir: Option<String>,

        /// Compiler driver (overrides CXX/CC)
        #[arg(long)]
        compiler: Option<String>,

        /// Python interpreter the modules are built for
        #[arg(long)]
        python: Option<String>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the manifest and check module init symbols in the sources
    Check {
        /// Path to extforge.toml
        #[arg(long, short)]
        manifest: Option<String>,

        /// Python interpreter used to locate binding libraries
        #[arg(long)]
        python: Option<String>,
    },

    /// Print the header include directory of a binding library
    Includes {
        /// Library name (e.g. pybind11)
        library: String,

        /// Python interpreter the library is installed into
        #[arg(long)]
        python: Option<String>,
    },

    /// Remove build output
    Clean {
        /// Path to extforge.toml
        #[arg(long, short)]
        manifest: Option<String>,

        /// Build root to clean
        #[arg(long)]
        build_dir: Option<String>,

        /// Remove the whole build root, not only temp/
        #[arg(long, short)]
        all: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    extforge::init_debug(cli.debug);

    let skip_config = cli.no_config || extforge::env_vars::ignore_config();
    let result = extforge::Config::load_with_options(cli.config.as_deref(), skip_config)
        .and_then(|config| match cli.command {
            Commands::Build {
                manifest,
                modules,
                build_dir,
                inplace,
                jobs,
                compiler,
                python,
                verbose,
            } => commands::build::run(
                &config,
                &commands::build::BuildArgs {
                    manifest,
                    modules,
                    build_dir,
                    inplace,
                    jobs,
                    compiler,
                    python,
                    verbose,
                },
            ),
            Commands::Plan {
                manifest,
                build_dir,
                compiler,
                python,
                json,
            } => commands::plan::run(
                &config,
                manifest.as_deref(),
                build_dir.as_deref(),
                compiler.as_deref(),
                python.as_deref(),
                json,
            ),
            Commands::Check { manifest, python } => {
                commands::check::run(&config, manifest.as_deref(), python.as_deref())
            }
            Commands::Includes { library, python } => {
                commands::includes::run(&config, &library, python.as_deref())
            }
            Commands::Clean {
                manifest,
                build_dir,
                all,
            } => commands::clean::run(&config, manifest.as_deref(), build_dir.as_deref(), all),
            Commands::Completion { shell } => commands::completion::run(shell),
        });

    if let Err(e) = result {
        display_error(&e, cli.backtrace);
        process::exit(1);
    }
}

mod commands;
