//! Includes command
//!
//! Print a binding library's header directory, like `python -m pybind11 --includes`

use anyhow::{Context, Result};
use extforge::Config;
use extforge::extensions::{library_for, resolve_include_dir};

pub(crate) fn run(config: &Config, library: &str, python: Option<&str>) -> Result<()> {
    let python = config.resolve_python(python);
    let handle = library_for(library, python.as_deref())?;
    let dir = resolve_include_dir(handle.as_ref())
        .with_context(|| format!("Cannot locate headers for {library}"))?;

    println!("{}", dir.display());
    Ok(())
}
