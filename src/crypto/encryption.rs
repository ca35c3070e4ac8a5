//! AES-256-GCM authenticated encryption of token values.
//!
//! Each call to `encrypt` generates a fresh random 32-byte salt and
//! 12-byte nonce, derives a one-off key from the passphrase with
//! Argon2id, and encrypts with AES-256-GCM.  All three components a
//! later `decrypt` needs travel together in `EncryptedValue`, which
//! serializes as a JSON object with base64 fields.
//!
//! The GCM auth tag is the sole correctness check: a wrong passphrase
//! and tampered ciphertext are indistinguishable and both fail with
//! `AuthenticationFailed`.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::errors::{Result, TokenVaultError};

use super::kdf::{derive_key, generate_salt, Argon2Params};
use super::serde_bytes::{base64_decode, base64_encode};

/// Size of the AES-256-GCM nonce in bytes.
const NONCE_LEN: usize = 12;

/// An encrypted token value: everything needed to decrypt it later
/// except the passphrase itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedValue {
    /// Ciphertext plus the 16-byte GCM auth tag.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub ciphertext: Vec<u8>,

    /// The 12-byte nonce used for this encryption.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub nonce: Vec<u8>,

    /// The 32-byte salt the key was derived with.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,
}

impl EncryptedValue {
    /// Serialize to the JSON string stored in the `encrypted_value` column.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| TokenVaultError::SerializationError(format!("encrypted value: {e}")))
    }

    /// Parse the JSON string stored in the `encrypted_value` column.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| TokenVaultError::MalformedCiphertext(format!("bad JSON: {e}")))
    }
}

/// Encrypt `plaintext` under a passphrase-derived key.
///
/// A fresh salt and nonce are generated per call, so encrypting the
/// same plaintext twice never produces the same output.
pub fn encrypt(
    plaintext: &[u8],
    passphrase: &[u8],
    params: &Argon2Params,
) -> Result<EncryptedValue> {
    let salt = generate_salt();
    let mut key = derive_key(passphrase, &salt, params)?;

    // Build the cipher from the derived key bytes.
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|e| {
        key.zeroize();
        TokenVaultError::EncryptionFailed(format!("invalid key length: {e}"))
    })?;
    key.zeroize();

    // Generate a random 12-byte nonce.
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    // Encrypt and authenticate the plaintext.
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| TokenVaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    Ok(EncryptedValue {
        ciphertext,
        nonce: nonce.to_vec(),
        salt: salt.to_vec(),
    })
}

/// Decrypt an `EncryptedValue` produced by `encrypt`.
///
/// Re-derives the key from the supplied passphrase and the stored salt.
/// A wrong passphrase fails the GCM tag check, as does any tampering
/// with the stored ciphertext.
pub fn decrypt(
    value: &EncryptedValue,
    passphrase: &[u8],
    params: &Argon2Params,
) -> Result<Vec<u8>> {
    if value.nonce.len() != NONCE_LEN {
        return Err(TokenVaultError::MalformedCiphertext(format!(
            "nonce must be {NONCE_LEN} bytes (got {})",
            value.nonce.len()
        )));
    }

    let mut key = derive_key(passphrase, &value.salt, params)?;

    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| {
        key.zeroize();
        TokenVaultError::AuthenticationFailed
    })?;
    key.zeroize();

    let nonce = Nonce::from_slice(&value.nonce);

    // Decrypt and verify the auth tag.
    let plaintext = cipher
        .decrypt(nonce, value.ciphertext.as_slice())
        .map_err(|_| TokenVaultError::AuthenticationFailed)?;

    Ok(plaintext)
}
