//! `SQLite`-backed key/value storage shared by every igf surface.
//!
//! The store is a single `kv` table with last-writer-wins semantics: each key
//! is overwritten atomically by `SQLite`, and no multi-key transaction is ever
//! required. Typed accessors cover the three keys igf actually uses.

use crate::error::{IgfError, Result, ResultExt};
use crate::model::Account;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use tracing::info;

const SCHEMA_VERSION: i32 = 1;

/// Storage key for the cached session user id.
pub const KEY_USER_ID: &str = "instagramUserId";
/// Storage key for the most recent analysis result (JSON `Account[]`).
pub const KEY_LAST_RESULTS: &str = "lastAnalysisResults";
/// Storage key for the timestamp of the most recent analysis run.
pub const KEY_LAST_RUN_AT: &str = "lastAnalysisAt";

/// `SQLite` storage manager
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open or create the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())?;

        // Set pragmas for performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be initialized.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA temp_store = MEMORY;")?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let current_version = self.get_schema_version();

        if current_version < SCHEMA_VERSION {
            info!(
                "Migrating database from version {} to {}",
                current_version, SCHEMA_VERSION
            );
            self.create_schema()?;
            self.set_schema_version(SCHEMA_VERSION)?;
        }

        Ok(())
    }

    fn get_schema_version(&self) -> i32 {
        let result: std::result::Result<i32, _> = self.conn.query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| {
                let value: String = row.get(0)?;
                Ok(value.parse().unwrap_or(0))
            },
        );

        // Treat missing schema table as version 0.
        result.unwrap_or_default()
    }

    fn set_schema_version(&self, version: i32) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('schema_version', ?1)",
            params![version.to_string()],
        )?;
        Ok(())
    }

    fn create_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS meta (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Read a raw value. An absent key reads as `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Write a raw value, replacing any previous one (last writer wins).
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // =========================================================================
    // Typed accessors
    // =========================================================================

    /// Cached session user id, if one has been published.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn user_id(&self) -> Result<Option<String>> {
        self.get(KEY_USER_ID)
    }

    /// Publish the session user id.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn set_user_id(&self, user_id: &str) -> Result<()> {
        self.set(KEY_USER_ID, user_id)
    }

    /// The most recent analysis result, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored JSON is corrupt.
    pub fn last_results(&self) -> Result<Option<Vec<Account>>> {
        let Some(raw) = self.get(KEY_LAST_RESULTS)? else {
            return Ok(None);
        };
        let accounts = serde_json::from_str(&raw).map_err(|e| IgfError::CorruptStoredValue {
            key: KEY_LAST_RESULTS,
            reason: e.to_string(),
        })?;
        Ok(Some(accounts))
    }

    /// Overwrite the single result slot with a new analysis result.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn set_last_results(&self, accounts: &[Account]) -> Result<()> {
        let raw = serde_json::to_string(accounts).context("serialize analysis results")?;
        self.set(KEY_LAST_RESULTS, &raw)
    }

    /// When the most recent analysis ran, if known.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn last_run_at(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.get(KEY_LAST_RUN_AT)? else {
            return Ok(None);
        };
        // A stale or hand-edited timestamp is not worth failing the read over.
        Ok(DateTime::parse_from_rfc3339(&raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)))
    }

    /// Record when an analysis ran.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn set_last_run_at(&self, at: DateTime<Utc>) -> Result<()> {
        self.set(KEY_LAST_RUN_AT, &at.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(pk: &str, username: &str) -> Account {
        Account {
            pk: pk.to_string(),
            username: username.to_string(),
            full_name: Some(format!("User {pk}")),
            profile_pic_url: None,
            is_verified: Some(false),
        }
    }

    #[test]
    fn absent_key_reads_as_none() {
        let storage = Storage::open_memory().unwrap();
        assert_eq!(storage.get("missing").unwrap(), None);
        assert_eq!(storage.user_id().unwrap(), None);
        assert_eq!(storage.last_results().unwrap(), None);
        assert_eq!(storage.last_run_at().unwrap(), None);
    }

    #[test]
    fn set_then_get_roundtrip() {
        let storage = Storage::open_memory().unwrap();
        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn last_writer_wins() {
        let storage = Storage::open_memory().unwrap();
        storage.set_user_id("111").unwrap();
        storage.set_user_id("222").unwrap();
        assert_eq!(storage.user_id().unwrap().as_deref(), Some("222"));
    }

    #[test]
    fn results_roundtrip_preserves_order() {
        let storage = Storage::open_memory().unwrap();
        let accounts = vec![account("3", "carol"), account("1", "alice")];
        storage.set_last_results(&accounts).unwrap();

        let read = storage.last_results().unwrap().unwrap();
        assert_eq!(read, accounts);
        assert_eq!(read[0].username, "carol");
    }

    #[test]
    fn result_slot_is_overwrite_only() {
        let storage = Storage::open_memory().unwrap();
        storage.set_last_results(&[account("1", "alice")]).unwrap();
        storage.set_last_results(&[account("2", "bob")]).unwrap();

        let read = storage.last_results().unwrap().unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].pk, "2");
    }

    #[test]
    fn corrupt_results_value_is_an_error() {
        let storage = Storage::open_memory().unwrap();
        storage.set(KEY_LAST_RESULTS, "not json").unwrap();
        assert!(matches!(
            storage.last_results(),
            Err(IgfError::CorruptStoredValue { .. })
        ));
    }

    #[test]
    fn run_timestamp_roundtrip() {
        let storage = Storage::open_memory().unwrap();
        let at = Utc::now();
        storage.set_last_run_at(at).unwrap();
        let read = storage.last_run_at().unwrap().unwrap();
        assert_eq!(read.timestamp(), at.timestamp());
    }

    #[test]
    fn reopening_keeps_data() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("igf.db");
        {
            let storage = Storage::open(&path).unwrap();
            storage.set_user_id("42").unwrap();
        }
        let storage = Storage::open(&path).unwrap();
        assert_eq!(storage.user_id().unwrap().as_deref(), Some("42"));
    }
}
