//! `tokenvault expiring` — show active tokens expiring soon.

use crate::cli::output;
use crate::cli::{open_vault, Cli};
use crate::errors::Result;

/// Execute the `expiring` command.
pub fn execute(cli: &Cli, days: Option<i64>) -> Result<()> {
    let (mut vault, settings) = open_vault(cli)?;
    vault.refresh()?;

    let days = days.unwrap_or(settings.expiring_days);
    let tokens = vault.expiring(days);

    if tokens.is_empty() {
        output::info(&format!("No active tokens expire within {days} days."));
        return Ok(());
    }

    output::warning(&format!(
        "{} active token(s) expire within {days} days:",
        tokens.len()
    ));
    output::print_tokens_table(&tokens);
    output::tip("Run `tokenvault update <ID> --rotate` after regenerating a credential.");

    Ok(())
}
