//! `tokenvault reveal` — decrypt and print a token's secret value.

use crate::cli::output;
use crate::cli::{open_vault, prompt_passphrase_for_vault, Cli};
use crate::errors::{Result, TokenVaultError};

/// Execute the `reveal` command.
pub fn execute(cli: &Cli, id: i64, copy: bool) -> Result<()> {
    let (mut vault, _settings) = open_vault(cli)?;
    vault.refresh()?;

    let vault_id = vault.store().path().to_string_lossy().to_string();
    let passphrase = prompt_passphrase_for_vault(Some(&vault_id))?;

    let value = vault.reveal(id, passphrase.as_bytes())?;

    if copy {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| TokenVaultError::CommandFailed(format!("clipboard: {e}")))?;
        clipboard
            .set_text(value.to_string())
            .map_err(|e| TokenVaultError::CommandFailed(format!("clipboard: {e}")))?;
        output::success("Secret copied to clipboard.");
    } else {
        // Print the plaintext to stdout so it can be piped.
        println!("{}", value.as_str());
    }

    Ok(())
}
