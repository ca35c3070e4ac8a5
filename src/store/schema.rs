//! SQLite schema for the token store.
//!
//! Three tables:
//! - `tokens`: one row per credential, with a `deleted_at` tombstone
//!   instead of physical deletes.
//! - `token_access_log`: append-only record of every create, update,
//!   delete, and reveal.
//! - `vault_meta`: key/value metadata (pinned KDF parameters, optional
//!   bootstrap passphrase hash).

use rusqlite::Connection;

pub(crate) const TOKENS_DDL: &str = "CREATE TABLE IF NOT EXISTS tokens (
    id                        INTEGER PRIMARY KEY AUTOINCREMENT,
    service_name              TEXT NOT NULL,
    token_type                TEXT NOT NULL DEFAULT '',
    encrypted_value           TEXT NOT NULL,
    regeneration_url          TEXT,
    regeneration_instructions TEXT,
    expiration_date           TEXT,
    status                    TEXT NOT NULL DEFAULT 'active',
    priority                  TEXT NOT NULL DEFAULT 'medium',
    usage_notes               TEXT NOT NULL DEFAULT '',
    tags                      TEXT NOT NULL DEFAULT '[]',
    used_by                   TEXT NOT NULL DEFAULT '[]',
    locations                 TEXT NOT NULL DEFAULT '[]',
    created_at                TEXT NOT NULL,
    last_updated              TEXT NOT NULL,
    last_accessed             TEXT,
    access_count              INTEGER NOT NULL DEFAULT 0,
    deleted_at                TEXT
);";

pub(crate) const ACCESS_LOG_DDL: &str = "CREATE TABLE IF NOT EXISTS token_access_log (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    token_id      INTEGER,
    action        TEXT NOT NULL,
    success       INTEGER NOT NULL,
    error_message TEXT,
    timestamp     TEXT NOT NULL
);";

pub(crate) const META_DDL: &str = "CREATE TABLE IF NOT EXISTS vault_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);";

/// Create all tables if they don't exist.  Idempotent.
pub(crate) fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(&format!("{TOKENS_DDL}\n{ACCESS_LOG_DDL}\n{META_DDL}"))
}
