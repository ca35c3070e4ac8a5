//! Passphrase hashing for first-time vault bootstrapping.
//!
//! The hash is stored in the vault's metadata table at `init` so later
//! commands can warn early on an obviously mistyped passphrase.  It is
//! never the decryption authority: each encrypted value carries its own
//! salt and the GCM tag check decides whether a passphrase is right.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::errors::{Result, TokenVaultError};

/// Hash a passphrase into a PHC string (Argon2id, default parameters).
pub fn hash_passphrase(passphrase: &[u8]) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(passphrase, &salt)
        .map_err(|e| TokenVaultError::PassphraseHashFailed(format!("Argon2id: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a passphrase against a stored PHC string.
///
/// Returns `Ok(true)` on a match, `Ok(false)` on a mismatch, and an
/// error only when the stored hash itself is malformed.
pub fn verify_passphrase(passphrase: &[u8], phc_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(phc_hash)
        .map_err(|e| TokenVaultError::PassphraseHashFailed(format!("stored hash: {e}")))?;

    match Argon2::default().verify_password(passphrase, &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(TokenVaultError::PassphraseHashFailed(format!(
            "verification: {e}"
        ))),
    }
}
