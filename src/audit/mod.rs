//! Audit log — read view over the token access log.
//!
//! Every create, update, delete, and reveal appends a row to
//! `token_access_log` through the store (fire-and-forget).  This module
//! is the query side, used by the `audit` command.
//!
//! Designed for graceful degradation: if the database can't be opened,
//! `open` returns `None` and callers report the log as unavailable
//! without failing anything else.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::errors::{Result, TokenVaultError};
use crate::store::{TokenStore, ACCESS_LOG_DDL};

/// A single access-log entry.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub token_id: Option<i64>,
    pub action: String,
    pub success: bool,
    pub error_message: Option<String>,
}

/// Read handle over the access log.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open the access log inside `<vault_dir>/tokens.db`.
    ///
    /// Returns `None` if the database can't be opened — callers should
    /// treat this as "audit log unavailable" and continue normally.
    pub fn open(vault_dir: &Path) -> Option<Self> {
        let db_path = TokenStore::db_path(vault_dir);
        let conn = Connection::open(&db_path).ok()?;

        // The store normally creates this; tolerate opening before it has.
        conn.execute_batch(ACCESS_LOG_DDL).ok()?;

        Some(Self { conn })
    }

    /// Query recent entries.
    ///
    /// - `limit`: maximum number of entries to return (most recent first).
    /// - `since`: if provided, only return entries newer than this timestamp.
    pub fn query(&self, limit: usize, since: Option<DateTime<Utc>>) -> Result<Vec<AuditEntry>> {
        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let (sql, params): (&str, Vec<Box<dyn rusqlite::types::ToSql>>) = match since {
            Some(ref ts) => (
                "SELECT id, timestamp, token_id, action, success, error_message
                 FROM token_access_log
                 WHERE timestamp >= ?1
                 ORDER BY id DESC
                 LIMIT ?2",
                vec![
                    Box::new(ts.to_rfc3339()) as Box<dyn rusqlite::types::ToSql>,
                    Box::new(limit_i64),
                ],
            ),
            None => (
                "SELECT id, timestamp, token_id, action, success, error_message
                 FROM token_access_log
                 ORDER BY id DESC
                 LIMIT ?1",
                vec![Box::new(limit_i64) as Box<dyn rusqlite::types::ToSql>],
            ),
        };

        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| TokenVaultError::AuditError(format!("query prepare: {e}")))?;

        let params_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| &**p).collect();

        let rows = stmt
            .query_map(params_refs.as_slice(), |row| {
                let ts_str: String = row.get(1)?;
                let timestamp = DateTime::parse_from_rfc3339(&ts_str)
                    .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

                Ok(AuditEntry {
                    id: row.get(0)?,
                    timestamp,
                    token_id: row.get(2)?,
                    action: row.get(3)?,
                    success: row.get(4)?,
                    error_message: row.get(5)?,
                })
            })
            .map_err(|e| TokenVaultError::AuditError(format!("query exec: {e}")))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| TokenVaultError::AuditError(format!("row parse: {e}")))?);
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TokenStore;
    use tempfile::TempDir;

    #[test]
    fn open_creates_log_table() {
        let dir = TempDir::new().unwrap();
        let audit = AuditLog::open(dir.path());
        assert!(audit.is_some(), "should open successfully");
        assert!(dir.path().join("tokens.db").exists());
    }

    #[test]
    fn log_and_query_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::create(dir.path()).unwrap();

        store.log_token_access(Some(1), "create", true, None);
        store.log_token_access(Some(1), "reveal", false, Some("wrong passphrase"));
        store.log_token_access(Some(2), "delete", true, None);

        let audit = AuditLog::open(dir.path()).unwrap();
        let entries = audit.query(10, None).unwrap();
        assert_eq!(entries.len(), 3);

        // Most recent first.
        assert_eq!(entries[0].action, "delete");
        assert_eq!(entries[1].action, "reveal");
        assert!(!entries[1].success);
        assert_eq!(entries[1].error_message.as_deref(), Some("wrong passphrase"));
        assert_eq!(entries[2].action, "create");
        assert!(entries[2].success);
    }

    #[test]
    fn query_with_limit() {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::create(dir.path()).unwrap();

        for i in 0..10 {
            store.log_token_access(Some(i), "reveal", true, None);
        }

        let audit = AuditLog::open(dir.path()).unwrap();
        let entries = audit.query(3, None).unwrap();
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn query_with_since_filter() {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::create(dir.path()).unwrap();

        store.log_token_access(Some(1), "create", true, None);

        let audit = AuditLog::open(dir.path()).unwrap();

        // A timestamp in the past should include the entry.
        let past = Utc::now() - chrono::Duration::hours(1);
        let entries = audit.query(10, Some(past)).unwrap();
        assert_eq!(entries.len(), 1);

        // A timestamp in the future should return nothing.
        let future = Utc::now() + chrono::Duration::hours(1);
        let entries = audit.query(10, Some(future)).unwrap();
        assert_eq!(entries.len(), 0);
    }

    #[test]
    fn entries_without_token_id_are_allowed() {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::create(dir.path()).unwrap();

        store.log_token_access(None, "create", false, Some("encryption failed"));

        let audit = AuditLog::open(dir.path()).unwrap();
        let entries = audit.query(1, None).unwrap();
        assert!(entries[0].token_id.is_none());
        assert!(!entries[0].success);
    }

    #[test]
    fn open_returns_none_on_bad_path() {
        let result = AuditLog::open(Path::new("/nonexistent/path/that/does/not/exist"));
        assert!(result.is_none());
    }
}
