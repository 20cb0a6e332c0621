//! SQLite-based key-value storage.
//!
//! Provides the persistent backing for streak state: a single `kv` table
//! holding the string-encoded keys the tracker reads and writes.

use std::path::Path;

use rusqlite::{params, Connection};

use super::data_dir;
use super::kv::KeyValueStore;
use crate::error::{DatabaseError, Result};

/// SQLite database for application state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/streakkeeper/<file_name>`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database
    /// cannot be opened or migrated.
    pub fn open(file_name: &str) -> Result<Self> {
        let path = data_dir()?.join(file_name);
        Self::open_at(&path)
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        tracing::debug!(path = %path.display(), "opened streak database");
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Delete a key from the kv store. Deleting an absent key is not an error.
    pub fn kv_delete(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Apply several writes in one transaction. `None` deletes the key.
    ///
    /// Either every entry is written or, on error, none is.
    pub fn kv_write_batch(&self, entries: &[(&str, Option<&str>)]) -> Result<(), rusqlite::Error> {
        let tx = self.conn.unchecked_transaction()?;
        for (key, value) in entries {
            match value {
                Some(value) => tx.execute(
                    "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                    params![key, value],
                )?,
                None => tx.execute("DELETE FROM kv WHERE key = ?1", params![key])?,
            };
        }
        tx.commit()
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Option<String> {
        match self.kv_get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read kv entry, treating as absent");
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Err(e) = self.kv_set(key, value) {
            tracing::warn!(key, error = %e, "failed to write kv entry");
        }
    }

    fn remove(&mut self, key: &str) {
        if let Err(e) = self.kv_delete(key) {
            tracing::warn!(key, error = %e, "failed to delete kv entry");
        }
    }

    fn write_batch(&mut self, entries: &[(&str, Option<&str>)]) {
        if let Err(e) = self.kv_write_batch(entries) {
            let keys: Vec<&str> = entries.iter().map(|(key, _)| *key).collect();
            tracing::warn!(?keys, error = %e, "failed to write kv batch, nothing written");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }

    #[test]
    fn kv_delete_is_idempotent() {
        let db = Database::open_memory().unwrap();
        db.kv_set("test", "hello").unwrap();
        db.kv_delete("test").unwrap();
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }

    #[test]
    fn trait_impl_reads_and_writes() {
        let mut db = Database::open_memory().unwrap();
        KeyValueStore::set(&mut db, "currentStreak", "3");
        assert_eq!(KeyValueStore::get(&db, "currentStreak").as_deref(), Some("3"));
        KeyValueStore::remove(&mut db, "currentStreak");
        assert!(KeyValueStore::get(&db, "currentStreak").is_none());
    }

    #[test]
    fn write_batch_commits_all_entries() {
        let db = Database::open_memory().unwrap();
        db.kv_set("stale", "x").unwrap();
        db.kv_write_batch(&[("a", Some("1")), ("stale", None), ("b", Some("2"))])
            .unwrap();
        assert_eq!(db.kv_get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(db.kv_get("b").unwrap().as_deref(), Some("2"));
        assert!(db.kv_get("stale").unwrap().is_none());
    }

    #[test]
    fn failed_batch_writes_nothing() {
        let mut db = Database::open_memory().unwrap();
        db.kv_set("currentStreak", "2").unwrap();
        db.conn()
            .execute_batch(
                "CREATE TRIGGER reject_updated BEFORE INSERT ON kv
                 WHEN NEW.key = 'lastUpdatedDate'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let batch = [
            ("lastVisitDate", Some("2024-09-05T09:00:00+03:00")),
            ("currentStreak", Some("3")),
            ("lastUpdatedDate", Some("2024-09-05T09:00:00+03:00")),
        ];
        assert!(db.kv_write_batch(&batch).is_err());
        KeyValueStore::write_batch(&mut db, &batch);

        assert!(db.kv_get("lastVisitDate").unwrap().is_none());
        assert_eq!(db.kv_get("currentStreak").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("streak.db");

        {
            let db = Database::open_at(&path).unwrap();
            db.kv_set("lastVisitDate", "2024-09-05T10:00:00+03:00").unwrap();
        }

        let db = Database::open_at(&path).unwrap();
        assert_eq!(
            db.kv_get("lastVisitDate").unwrap().as_deref(),
            Some("2024-09-05T10:00:00+03:00")
        );
    }

    #[test]
    fn open_at_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("no/such/dir/streak.db");
        assert!(Database::open_at(&path).is_err());
    }
}
