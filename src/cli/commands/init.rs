//! `tokenvault init` — create a new vault database.

use std::fs;

use crate::cli::output;
use crate::cli::{prompt_new_passphrase, resolve_vault_dir, Cli};
use crate::config::Settings;
use crate::crypto::hash_passphrase;
use crate::errors::Result;
use crate::store::TokenStore;

/// Execute the `init` command.
pub fn execute(cli: &Cli, no_passphrase_hash: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(&cwd)?;
    let vault_dir = resolve_vault_dir(cli, &settings)?;

    // 1. Create the vault directory if it doesn't exist.
    if !vault_dir.exists() {
        fs::create_dir_all(&vault_dir)?;
        let dir_display = vault_dir.display();
        output::info(&format!("Created vault directory: {dir_display}"));
    }

    // 2. Create the token database (fails if one already exists).
    let store = TokenStore::create(&vault_dir)?;

    // 3. Pin the KDF parameters new values will be encrypted under.
    store.store_kdf_params(&settings.argon2_params())?;

    // 4. Optionally record a passphrase hash for early typo detection.
    //    Decryption stays the authority either way.
    if no_passphrase_hash {
        output::info("Skipping passphrase hash; typos surface only at decrypt time.");
    } else {
        let passphrase = prompt_new_passphrase()?;
        let hash = hash_passphrase(passphrase.as_bytes())?;
        store.store_passphrase_hash(&hash)?;
    }

    store.log_token_access(None, "init", true, None);

    output::success(&format!(
        "Vault created at {}",
        store.path().display()
    ));
    output::tip("Run `tokenvault add <SERVICE>` to store a credential.");
    output::tip("Run `tokenvault list` to see stored tokens.");

    Ok(())
}
