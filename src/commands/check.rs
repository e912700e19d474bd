//! Check command
//!
//! Validate the manifest without compiling anything

use anyhow::Result;
use extforge::Config;
use extforge::extensions::check_init_symbol;

pub(crate) fn run(config: &Config, manifest: Option<&str>, python: Option<&str>) -> Result<()> {
    let python = config.resolve_python(python);
    let manifest = super::manifest_path(manifest);
    let package = super::load_package(&manifest, python.as_deref())?;

    let metadata = package.metadata();
    println!("{} {}", metadata.name, metadata.version);

    let mut mismatches = 0;
    for module in package.extensions() {
        let missing: Vec<_> = module
            .source_files()
            .iter()
            .filter(|source| !source.is_file())
            .collect();

        println!(
            "  {} ({}, {} source{})",
            module.module_name(),
            module.language(),
            module.source_files().len(),
            if module.source_files().len() == 1 { "" } else { "s" }
        );
        for source in missing {
            eprintln!("    warning: source not found: {}", source.display());
        }

        for mismatch in check_init_symbol(module) {
            mismatches += 1;
            eprintln!(
                "    {} defines module '{}', expected '{}'",
                mismatch.source.display(),
                mismatch.found,
                mismatch.expected
            );
        }
    }

    if mismatches > 0 {
        anyhow::bail!("{mismatches} source(s) define a different module than declared");
    }

    println!("Manifest OK");
    Ok(())
}
