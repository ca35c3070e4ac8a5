//! Vault state container.
//!
//! `Vault` owns the in-memory token list and orchestrates the
//! encrypt-before-write and decrypt-on-demand flows on top of the
//! persistence gateway.  It is an explicit context object: presentation
//! code never mutates the token list directly, it goes through the
//! methods here (single-writer discipline).
//!
//! Partial-failure semantics favor staleness over data loss: a failed
//! refresh records an error and leaves the previous list untouched.

use chrono::{DateTime, Utc};
use zeroize::{Zeroize, Zeroizing};

use crate::config::Settings;
use crate::crypto::{self, Argon2Params};
use crate::errors::{Result, TokenVaultError};
use crate::store::TokenStore;
use crate::token::{
    expiring_within, filter_tokens, sort_tokens, SortDirection, SortField, Token, TokenDraft,
    TokenFilter, TokenPatch,
};

/// The vault: gateway handle, pinned KDF parameters, and the local
/// mirror of the server's token list.
pub struct Vault {
    store: TokenStore,
    kdf: Argon2Params,
    tokens: Vec<Token>,
    last_refreshed: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl Vault {
    /// Build a vault around an open store.
    ///
    /// Best-effort initialization: the KDF parameters pinned in the
    /// store's metadata win, then the configured settings, then
    /// defaults.  Nothing here blocks vault availability.
    pub fn initialize(store: TokenStore, settings: &Settings) -> Self {
        let kdf = store
            .kdf_params()
            .ok()
            .flatten()
            .unwrap_or_else(|| settings.argon2_params());

        Self {
            store,
            kdf,
            tokens: Vec::new(),
            last_refreshed: None,
            last_error: None,
        }
    }

    /// The local token list, as of the last successful refresh.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The most recent refresh failure, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed
    }

    /// The underlying persistence gateway.
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// The KDF parameters new encryptions use.
    pub fn kdf_params(&self) -> &Argon2Params {
        &self.kdf
    }

    // ------------------------------------------------------------------
    // Refresh
    // ------------------------------------------------------------------

    /// Pull the full token list from the store (tombstones excluded),
    /// replacing local state atomically on success.
    ///
    /// On failure the previous list stays as-is and the error is both
    /// recorded and returned.
    pub fn refresh(&mut self) -> Result<()> {
        match self.store.list() {
            Ok(tokens) => {
                self.tokens = tokens;
                self.last_refreshed = Some(Utc::now());
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Encrypt the draft's secret and insert a new token.
    ///
    /// Validation and encryption failures abort before anything touches
    /// storage.  The created row is appended to local state.
    pub fn add_token(&mut self, draft: TokenDraft, passphrase: &[u8]) -> Result<Token> {
        draft.validate()?;

        let encrypted = match crypto::encrypt(draft.secret.as_bytes(), passphrase, &self.kdf) {
            Ok(enc) => enc,
            Err(e) => {
                self.store
                    .log_token_access(None, "create", false, Some(&e.to_string()));
                return Err(e);
            }
        };

        let token = match self.store.insert(&draft, &encrypted) {
            Ok(token) => token,
            Err(e) => {
                self.store
                    .log_token_access(None, "create", false, Some(&e.to_string()));
                return Err(e);
            }
        };

        self.store
            .log_token_access(Some(token.id), "create", true, None);
        self.tokens.push(token.clone());
        Ok(token)
    }

    /// Apply a partial update.  A new secret value (if supplied)
    /// requires the passphrase and is re-encrypted before the store
    /// call; metadata-only patches touch no crypto at all.
    ///
    /// Local state is updated only after store confirmation.
    pub fn update_token(
        &mut self,
        id: i64,
        patch: TokenPatch,
        passphrase: Option<&[u8]>,
    ) -> Result<Token> {
        patch.validate()?;
        if patch.is_empty() {
            return Err(TokenVaultError::ValidationFailed(
                "nothing to update".into(),
            ));
        }

        let encrypted = match (&patch.secret, passphrase) {
            (Some(secret), Some(passphrase)) => {
                Some(crypto::encrypt(secret.as_bytes(), passphrase, &self.kdf)?)
            }
            (Some(_), None) => {
                return Err(TokenVaultError::ValidationFailed(
                    "a passphrase is required to change the secret value".into(),
                ));
            }
            (None, _) => None,
        };

        if let Err(e) = self.store.update(id, &patch, encrypted.as_ref()) {
            self.store
                .log_token_access(Some(id), "update", false, Some(&e.to_string()));
            return Err(e);
        }

        let updated = self.store.get(id)?;
        self.store.log_token_access(Some(id), "update", true, None);

        if let Some(local) = self.tokens.iter_mut().find(|t| t.id == id) {
            *local = updated.clone();
        }
        Ok(updated)
    }

    /// Soft-delete a token server-side, then drop it from local state.
    pub fn delete_token(&mut self, id: i64) -> Result<()> {
        if let Err(e) = self.store.soft_delete_token(id) {
            self.store
                .log_token_access(Some(id), "delete", false, Some(&e.to_string()));
            return Err(e);
        }

        self.store.log_token_access(Some(id), "delete", true, None);
        self.tokens.retain(|t| t.id != id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reveal
    // ------------------------------------------------------------------

    /// Decrypt a token's secret value for display.
    ///
    /// Looks up the local encrypted blob, so the list must have been
    /// refreshed first.  Every reveal re-decrypts; plaintext is never
    /// cached in vault state.  Success and failure are both audited.
    pub fn reveal(&mut self, id: i64, passphrase: &[u8]) -> Result<Zeroizing<String>> {
        let token = self
            .tokens
            .iter()
            .find(|t| t.id == id)
            .ok_or(TokenVaultError::TokenNotFound(id))?;

        let plaintext_bytes = match crypto::decrypt(&token.encrypted_value, passphrase, &self.kdf)
        {
            Ok(bytes) => bytes,
            Err(e) => {
                self.store
                    .log_token_access(Some(id), "reveal", false, Some(&e.to_string()));
                return Err(e);
            }
        };

        self.store.record_access(id);
        self.store.log_token_access(Some(id), "reveal", true, None);

        let now = Utc::now();
        if let Some(local) = self.tokens.iter_mut().find(|t| t.id == id) {
            local.access_count += 1;
            local.last_accessed = Some(now);
        }

        // Convert to String via from_utf8 which takes ownership (no clone).
        // On error, zeroize the bytes inside the error before discarding.
        String::from_utf8(plaintext_bytes)
            .map(Zeroizing::new)
            .map_err(|e| {
                let mut bad_bytes = e.into_bytes();
                bad_bytes.zeroize();
                TokenVaultError::SerializationError("secret value is not valid UTF-8".to_string())
            })
    }

    // ------------------------------------------------------------------
    // Queries (pure projections over local state)
    // ------------------------------------------------------------------

    /// Filter and optionally sort the local list, returning owned rows
    /// for display.
    pub fn query(
        &self,
        filter: &TokenFilter,
        sort: Option<(SortField, SortDirection)>,
    ) -> Vec<Token> {
        let mut matches: Vec<Token> = filter_tokens(&self.tokens, filter)
            .into_iter()
            .cloned()
            .collect();
        if let Some((field, direction)) = sort {
            sort_tokens(&mut matches, field, direction);
        }
        matches
    }

    /// Active tokens expiring within `days` days of now.
    pub fn expiring(&self, days: i64) -> Vec<Token> {
        expiring_within(&self.tokens, days, Utc::now())
            .into_iter()
            .cloned()
            .collect()
    }
}
