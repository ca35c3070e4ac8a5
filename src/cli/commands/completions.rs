//! `tokenvault completions` — generate shell completion scripts.

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::{Result, TokenVaultError};

/// Execute the `completions` command.
pub fn execute(shell: &str) -> Result<()> {
    let shell: Shell = shell.parse().map_err(|_| {
        TokenVaultError::CommandFailed(format!(
            "unknown shell '{shell}' (expected bash, zsh, fish, or powershell)"
        ))
    })?;

    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "tokenvault", &mut std::io::stdout());

    Ok(())
}
