//! OS keyring integration for passphrase caching.
//!
//! Stores and retrieves the vault passphrase from the operating
//! system's secure credential store:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring / KDE Wallet)
//!
//! All operations fail gracefully — if the keyring is unavailable, the
//! error is returned and the caller falls back to a passphrase prompt.

use crate::errors::{Result, TokenVaultError};

/// Service name used in the OS keyring.
const SERVICE_NAME: &str = "tokenvault";

/// Build a keyring entry key from a vault path.
fn entry_key(vault_path: &str) -> String {
    format!("vault:{vault_path}")
}

/// Store a passphrase in the OS keyring for a specific vault.
pub fn store_passphrase(vault_path: &str, passphrase: &str) -> Result<()> {
    let entry = keyring::Entry::new(SERVICE_NAME, &entry_key(vault_path)).map_err(|e| {
        TokenVaultError::KeyringError(format!("failed to create keyring entry: {e}"))
    })?;

    entry.set_password(passphrase).map_err(|e| {
        TokenVaultError::KeyringError(format!("failed to store passphrase in keyring: {e}"))
    })?;

    Ok(())
}

/// Retrieve a passphrase from the OS keyring for a specific vault.
///
/// Returns `None` if no passphrase is stored (rather than an error).
pub fn get_passphrase(vault_path: &str) -> Result<Option<String>> {
    let entry = keyring::Entry::new(SERVICE_NAME, &entry_key(vault_path)).map_err(|e| {
        TokenVaultError::KeyringError(format!("failed to create keyring entry: {e}"))
    })?;

    match entry.get_password() {
        Ok(passphrase) => Ok(Some(passphrase)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(TokenVaultError::KeyringError(format!(
            "failed to read from keyring: {e}"
        ))),
    }
}

/// Delete a stored passphrase from the OS keyring.
pub fn delete_passphrase(vault_path: &str) -> Result<()> {
    let entry = keyring::Entry::new(SERVICE_NAME, &entry_key(vault_path)).map_err(|e| {
        TokenVaultError::KeyringError(format!("failed to create keyring entry: {e}"))
    })?;

    match entry.delete_credential() {
        Ok(()) => Ok(()),
        Err(keyring::Error::NoEntry) => Ok(()), // Already gone, that's fine.
        Err(e) => Err(TokenVaultError::KeyringError(format!(
            "failed to delete from keyring: {e}"
        ))),
    }
}
