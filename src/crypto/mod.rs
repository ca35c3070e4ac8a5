//! Cryptographic primitives for TokenVault.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption of token values (`encryption`)
//! - Argon2id passphrase-based key derivation (`kdf`)
//! - Passphrase hashing for vault bootstrapping (`passphrase`)

pub mod encryption;
pub mod kdf;
pub mod passphrase;

mod serde_bytes;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, EncryptedValue, ...};
pub use encryption::{decrypt, encrypt, EncryptedValue};
pub use kdf::{derive_key, generate_salt, Argon2Params};
pub use passphrase::{hash_passphrase, verify_passphrase};
