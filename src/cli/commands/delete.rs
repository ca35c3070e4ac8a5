//! `tokenvault delete` — soft-delete a token.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{open_vault, Cli};
use crate::errors::{Result, TokenVaultError};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, id: i64, force: bool) -> Result<()> {
    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete token {id}?"))
            .default(false)
            .interact()
            .map_err(|e| TokenVaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let (mut vault, _settings) = open_vault(cli)?;
    vault.delete_token(id)?;

    output::success(&format!("Token {id} deleted"));
    output::tip("The row is tombstoned, not erased; the access log keeps its history.");

    Ok(())
}
