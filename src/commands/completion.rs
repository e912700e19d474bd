//! Completion command
//!
//! Generate shell completion scripts

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io;

/// Write the completion script for `shell` to stdout.
///
/// ```bash
/// extforge completion bash > /usr/local/share/bash-completion/completions/extforge
/// extforge completion zsh > /usr/local/share/zsh/site-functions/_extforge
/// ```
#[allow(
    clippy::unnecessary_wraps,
    reason = "Result type maintained for consistency with command signature pattern"
)]
pub(crate) fn run(shell: Shell) -> Result<()> {
    let mut cmd = crate::Cli::command();
    generate(shell, &mut cmd, "extforge", &mut io::stdout());
    Ok(())
}
