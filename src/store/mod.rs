//! Persistence gateway over SQLite.
//!
//! `TokenStore` is a thin adapter between the vault container and the
//! `tokens` database: plain CRUD, a tombstone-based soft delete, and a
//! fire-and-forget access log.  Re-encryption of secret values happens
//! in the caller; nothing in this module ever sees plaintext.
//!
//! Transient availability errors (`SQLITE_BUSY` / `SQLITE_LOCKED`) are
//! retried a bounded number of times with linear backoff, then surfaced
//! as `StorageUnavailable`.  All other SQL errors surface immediately.

mod schema;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::crypto::{Argon2Params, EncryptedValue};
use crate::errors::{Result, TokenVaultError};
use crate::token::{Token, TokenDraft, TokenPatch, TokenPriority, TokenStatus};

pub(crate) use schema::ACCESS_LOG_DDL;

/// File name of the token database inside the vault directory.
const DB_FILE: &str = "tokens.db";

/// How many times a transient storage error is attempted before giving up.
const MAX_ATTEMPTS: u32 = 3;

/// Base delay between attempts; attempt N waits N times this.
const RETRY_DELAY: Duration = Duration::from_millis(50);

/// Columns selected for every token read, in `row_to_token` order.
const TOKEN_COLUMNS: &str = "id, service_name, token_type, encrypted_value, \
     regeneration_url, regeneration_instructions, expiration_date, status, priority, \
     usage_notes, tags, used_by, locations, created_at, last_updated, last_accessed, \
     access_count";

/// Metadata keys in `vault_meta`.
const META_KDF_PARAMS: &str = "kdf_params";
const META_PASSPHRASE_HASH: &str = "passphrase_hash";

/// The persistence gateway.  Create one with `TokenStore::create` or
/// `TokenStore::open`, then use its methods for all row access.
pub struct TokenStore {
    conn: Connection,
    path: PathBuf,
}

impl TokenStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create a brand-new token database at `<vault_dir>/tokens.db`.
    pub fn create(vault_dir: &Path) -> Result<Self> {
        let path = Self::db_path(vault_dir);
        if path.exists() {
            return Err(TokenVaultError::VaultAlreadyExists(path));
        }
        Self::open_at(path)
    }

    /// Open an existing token database.
    pub fn open(vault_dir: &Path) -> Result<Self> {
        let path = Self::db_path(vault_dir);
        if !path.exists() {
            return Err(TokenVaultError::VaultNotFound(path));
        }
        Self::open_at(path)
    }

    /// Path of the token database for a vault directory.
    pub fn db_path(vault_dir: &Path) -> PathBuf {
        vault_dir.join(DB_FILE)
    }

    fn open_at(path: PathBuf) -> Result<Self> {
        let conn = Connection::open(&path)
            .map_err(|e| TokenVaultError::StorageError(format!("open {}: {e}", path.display())))?;

        // Restrictive permissions on the database file (owner-only).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&path, perms);
        }

        conn.busy_timeout(Duration::from_millis(250))
            .map_err(|e| TokenVaultError::StorageError(format!("busy timeout: {e}")))?;

        schema::init_schema(&conn)
            .map_err(|e| TokenVaultError::StorageError(format!("schema: {e}")))?;

        Ok(Self { conn, path })
    }

    /// Returns the path to the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ------------------------------------------------------------------
    // Token rows
    // ------------------------------------------------------------------

    /// All non-deleted tokens, ordered by service name ascending.
    pub fn list(&self) -> Result<Vec<Token>> {
        let sql = format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens
             WHERE deleted_at IS NULL
             ORDER BY service_name COLLATE NOCASE ASC"
        );
        self.with_retry("list tokens", |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], row_to_token)?;
            rows.collect()
        })
    }

    /// A single non-deleted token.  Tombstoned and missing rows are both
    /// `TokenNotFound`.
    pub fn get(&self, id: i64) -> Result<Token> {
        let sql =
            format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE id = ?1 AND deleted_at IS NULL");
        self.with_retry("get token", |conn| {
            conn.query_row(&sql, params![id], row_to_token).optional()
        })?
        .ok_or(TokenVaultError::TokenNotFound(id))
    }

    /// Insert a new token row.  The store assigns the id and both
    /// timestamps; the encrypted value was produced by the caller.
    pub fn insert(&self, draft: &TokenDraft, encrypted: &EncryptedValue) -> Result<Token> {
        let now = Utc::now().to_rfc3339();
        let encrypted_json = encrypted.to_json()?;
        let tags = to_json_text("tags", &draft.tags)?;
        let used_by = to_json_text("used_by", &draft.used_by)?;
        let locations = to_json_text("locations", &draft.locations)?;
        let status = draft.status.unwrap_or(TokenStatus::Active);
        let priority = draft.priority.unwrap_or(TokenPriority::Medium);

        let id = self.with_retry("insert token", |conn| {
            conn.execute(
                "INSERT INTO tokens (service_name, token_type, encrypted_value,
                    regeneration_url, regeneration_instructions, expiration_date,
                    status, priority, usage_notes, tags, used_by, locations,
                    created_at, last_updated, access_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, 0)",
                params![
                    draft.service_name,
                    draft.token_type,
                    encrypted_json,
                    draft.regeneration_url,
                    draft.regeneration_instructions,
                    draft.expiration_date.map(|d| d.to_rfc3339()),
                    status.as_str(),
                    priority.as_str(),
                    draft.usage_notes,
                    tags,
                    used_by,
                    locations,
                    now,
                    now,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        self.get(id)
    }

    /// Apply a partial update.  Only supplied fields change; a new
    /// encrypted value (if any) was re-encrypted by the caller.
    /// `last_updated` is always bumped.
    pub fn update(
        &self,
        id: i64,
        patch: &TokenPatch,
        encrypted: Option<&EncryptedValue>,
    ) -> Result<()> {
        // Existence check gives tombstoned rows the same NotFound as
        // missing ones.
        self.get(id)?;

        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(v) = &patch.service_name {
            sets.push("service_name = ?");
            values.push(Box::new(v.clone()));
        }
        if let Some(v) = &patch.token_type {
            sets.push("token_type = ?");
            values.push(Box::new(v.clone()));
        }
        if let Some(enc) = encrypted {
            sets.push("encrypted_value = ?");
            values.push(Box::new(enc.to_json()?));
        }
        if let Some(v) = &patch.regeneration_url {
            sets.push("regeneration_url = ?");
            values.push(Box::new(v.clone()));
        }
        if let Some(v) = &patch.regeneration_instructions {
            sets.push("regeneration_instructions = ?");
            values.push(Box::new(v.clone()));
        }
        if let Some(v) = &patch.expiration_date {
            sets.push("expiration_date = ?");
            values.push(Box::new(v.map(|d| d.to_rfc3339())));
        }
        if let Some(v) = patch.status {
            sets.push("status = ?");
            values.push(Box::new(v.as_str()));
        }
        if let Some(v) = patch.priority {
            sets.push("priority = ?");
            values.push(Box::new(v.as_str()));
        }
        if let Some(v) = &patch.usage_notes {
            sets.push("usage_notes = ?");
            values.push(Box::new(v.clone()));
        }
        if let Some(v) = &patch.tags {
            sets.push("tags = ?");
            values.push(Box::new(to_json_text("tags", v)?));
        }
        if let Some(v) = &patch.used_by {
            sets.push("used_by = ?");
            values.push(Box::new(to_json_text("used_by", v)?));
        }
        if let Some(v) = &patch.locations {
            sets.push("locations = ?");
            values.push(Box::new(to_json_text("locations", v)?));
        }

        sets.push("last_updated = ?");
        values.push(Box::new(Utc::now().to_rfc3339()));
        values.push(Box::new(id));

        let sql = format!(
            "UPDATE tokens SET {} WHERE id = ? AND deleted_at IS NULL",
            sets.join(", ")
        );

        self.with_retry("update token", |conn| {
            let value_refs: Vec<&dyn rusqlite::types::ToSql> =
                values.iter().map(|v| &**v).collect();
            conn.execute(&sql, value_refs.as_slice())
        })?;

        Ok(())
    }

    /// Soft-delete: set the tombstone timestamp instead of removing the
    /// row, preserving the audit trail.
    pub fn soft_delete_token(&self, id: i64) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let affected = self.with_retry("delete token", |conn| {
            conn.execute(
                "UPDATE tokens SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
                params![now, id],
            )
        })?;

        if affected == 0 {
            return Err(TokenVaultError::TokenNotFound(id));
        }
        Ok(())
    }

    /// Bump a token's access count and last-accessed timestamp.
    /// Best-effort: a failure here never aborts the reveal that
    /// triggered it.
    pub fn record_access(&self, id: i64) {
        let now = Utc::now().to_rfc3339();
        let _ = self.conn.execute(
            "UPDATE tokens SET access_count = access_count + 1, last_accessed = ?1
             WHERE id = ?2 AND deleted_at IS NULL",
            params![now, id],
        );
    }

    /// Append to the access log.  Fire-and-forget: errors are silently
    /// ignored so audit problems never block the primary operation.
    pub fn log_token_access(
        &self,
        token_id: Option<i64>,
        action: &str,
        success: bool,
        error_message: Option<&str>,
    ) {
        let now = Utc::now().to_rfc3339();
        let _ = self.conn.execute(
            "INSERT INTO token_access_log (token_id, action, success, error_message, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![token_id, action, success, error_message, now],
        );
    }

    // ------------------------------------------------------------------
    // Vault metadata
    // ------------------------------------------------------------------

    /// Pin the KDF parameters the vault's values are encrypted under.
    pub fn store_kdf_params(&self, kdf: &Argon2Params) -> Result<()> {
        let json = to_json_text("kdf params", kdf)?;
        self.set_meta(META_KDF_PARAMS, &json)
    }

    /// The pinned KDF parameters, if the vault has recorded them.
    pub fn kdf_params(&self) -> Result<Option<Argon2Params>> {
        match self.get_meta(META_KDF_PARAMS)? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| TokenVaultError::SerializationError(format!("kdf params: {e}"))),
            None => Ok(None),
        }
    }

    /// Record the optional bootstrap passphrase hash.
    pub fn store_passphrase_hash(&self, phc_hash: &str) -> Result<()> {
        self.set_meta(META_PASSPHRASE_HASH, phc_hash)
    }

    /// The bootstrap passphrase hash, if one was recorded at init.
    pub fn passphrase_hash(&self) -> Result<Option<String>> {
        self.get_meta(META_PASSPHRASE_HASH)
    }

    fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.with_retry("set metadata", |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO vault_meta (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
        })?;
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<String>> {
        self.with_retry("get metadata", |conn| {
            conn.query_row(
                "SELECT value FROM vault_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
        })
    }

    // ------------------------------------------------------------------
    // Retry policy
    // ------------------------------------------------------------------

    /// Run `op`, retrying transient busy/locked errors with linear
    /// backoff.  After `MAX_ATTEMPTS` the transient error surfaces as
    /// `StorageUnavailable`; everything else surfaces immediately.
    fn with_retry<T, F>(&self, op_name: &str, mut op: F) -> Result<T>
    where
        F: FnMut(&Connection) -> rusqlite::Result<T>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match op(&self.conn) {
                Ok(value) => return Ok(value),
                Err(e) if is_transient(&e) => {
                    if attempt >= MAX_ATTEMPTS {
                        return Err(TokenVaultError::StorageUnavailable {
                            attempts: attempt,
                            message: format!("{op_name}: {e}"),
                        });
                    }
                    std::thread::sleep(RETRY_DELAY * attempt);
                }
                Err(e) => {
                    return Err(TokenVaultError::StorageError(format!("{op_name}: {e}")));
                }
            }
        }
    }
}

/// True for SQLite's transient availability errors, the local analog of
/// a flaky network to a hosted store.
fn is_transient(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(ffi_err, _)
            if matches!(
                ffi_err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            )
    )
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Map a `tokens` row (in `TOKEN_COLUMNS` order) to a `Token`.
fn row_to_token(row: &Row<'_>) -> rusqlite::Result<Token> {
    let encrypted_json: String = row.get(3)?;
    let encrypted_value = EncryptedValue::from_json(&encrypted_json)
        .map_err(|e| conversion_failure(3, e))?;

    let status: String = row.get(7)?;
    let status: TokenStatus = status.parse().map_err(|e| conversion_failure(7, e))?;

    let priority: String = row.get(8)?;
    let priority: TokenPriority = priority.parse().map_err(|e| conversion_failure(8, e))?;

    let tags: String = row.get(10)?;
    let tags: Vec<String> =
        serde_json::from_str(&tags).map_err(|e| conversion_failure(10, e))?;

    let used_by: String = row.get(11)?;
    let used_by: Vec<String> =
        serde_json::from_str(&used_by).map_err(|e| conversion_failure(11, e))?;

    let locations: String = row.get(12)?;
    let locations = serde_json::from_str(&locations).map_err(|e| conversion_failure(12, e))?;

    Ok(Token {
        id: row.get(0)?,
        service_name: row.get(1)?,
        token_type: row.get(2)?,
        encrypted_value,
        regeneration_url: row.get(4)?,
        regeneration_instructions: row.get(5)?,
        expiration_date: parse_optional_timestamp(row, 6)?,
        status,
        priority,
        usage_notes: row.get(9)?,
        tags,
        used_by,
        locations,
        created_at: parse_timestamp(row, 13)?,
        last_updated: parse_timestamp(row, 14)?,
        last_accessed: parse_optional_timestamp(row, 15)?,
        access_count: row.get(16)?,
    })
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_failure(idx, e))
}

fn parse_optional_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let text: Option<String> = row.get(idx)?;
    match text {
        Some(t) => DateTime::parse_from_rfc3339(&t)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| conversion_failure(idx, e)),
        None => Ok(None),
    }
}

fn conversion_failure<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn to_json_text<T: Serialize>(what: &str, value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| TokenVaultError::SerializationError(format!("{what}: {e}")))
}
