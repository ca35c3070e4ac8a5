use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in TokenVault.
#[derive(Debug, Error)]
pub enum TokenVaultError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: wrong passphrase or corrupted data")]
    AuthenticationFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Passphrase hashing failed: {0}")]
    PassphraseHashFailed(String),

    #[error("Malformed encrypted value: {0}")]
    MalformedCiphertext(String),

    // --- Storage errors ---
    #[error("Vault not found at {0}")]
    VaultNotFound(PathBuf),

    #[error("Vault already exists at {0}")]
    VaultAlreadyExists(PathBuf),

    #[error("Storage unavailable after {attempts} attempts: {message}")]
    StorageUnavailable { attempts: u32, message: String },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Token {0} not found")]
    TokenNotFound(i64),

    // --- Validation errors ---
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    // --- Keyring errors ---
    #[cfg(feature = "keyring-store")]
    #[error("Keyring error: {0}")]
    KeyringError(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- Audit errors ---
    #[error("Audit error: {0}")]
    AuditError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,

    #[error("Passphrase mismatch: passphrases do not match")]
    PassphraseMismatch,
}

/// Convenience type alias for TokenVault results.
pub type Result<T> = std::result::Result<T, TokenVaultError>;
