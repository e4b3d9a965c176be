//! Keyed snapshot cache backed by the local store.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::FieldlogError;
use crate::storage::{self, Database};

/// A last-known-good snapshot of a read result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Caller-chosen key, e.g. a collection name
    pub key: String,
    /// The cached payload
    pub data: Value,
    /// Write time in milliseconds since the epoch
    pub timestamp: i64,
}

impl CacheEntry {
    /// When the snapshot was written.
    #[must_use]
    pub fn cached_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or_default()
    }

    /// How old the snapshot is.
    #[must_use]
    pub fn age(&self) -> Duration {
        Utc::now() - self.cached_at()
    }

    /// Whether the snapshot is older than `max_age`.
    #[must_use]
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.age() > max_age
    }
}

/// Read cache for offline display.
///
/// At most one entry per key, last write wins. Nothing expires on its own.
#[derive(Debug, Clone)]
pub struct CacheManager {
    db: Arc<Database>,
}

impl CacheManager {
    /// Create a cache over the process-wide store.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the store cannot be opened.
    pub fn new() -> Result<Self, FieldlogError> {
        Ok(Self::with_database(storage::shared()?))
    }

    /// Create a cache over an existing store.
    #[must_use]
    pub const fn with_database(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store a snapshot under `key`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` if the data cannot be serialized or written.
    pub fn put<T>(&self, key: &str, data: &T) -> Result<(), FieldlogError>
    where
        T: Serialize + ?Sized,
    {
        let json = serde_json::to_string(data)
            .map_err(|e| FieldlogError::operation("Failed to serialize cache entry", e))?;
        let now = Utc::now().timestamp_millis();

        self.db.transaction("Failed to write cache entry", |tx| {
            tx.execute(
                r"INSERT INTO cache (key, data, timestamp) VALUES (?1, ?2, ?3)
                  ON CONFLICT(key) DO UPDATE SET data = excluded.data, timestamp = excluded.timestamp",
                params![key, json, now],
            )
        })?;

        debug!(key, "Cached snapshot");
        Ok(())
    }

    /// Get the snapshot stored under `key`.
    ///
    /// A missing key is `Ok(None)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` if the query fails.
    pub fn get(&self, key: &str) -> Result<Option<Value>, FieldlogError> {
        Ok(self.entry(key)?.map(|entry| entry.data))
    }

    /// Get the snapshot under `key` decoded as `T`.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` if the query fails or the stored data does
    /// not match `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, FieldlogError> {
        self.get(key)?
            .map(|value| {
                serde_json::from_value(value).map_err(|e| {
                    FieldlogError::operation(format!("Failed to decode cache entry {key}"), e)
                })
            })
            .transpose()
    }

    /// Get the full entry, including its write time.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` if the query fails.
    pub fn entry(&self, key: &str) -> Result<Option<CacheEntry>, FieldlogError> {
        self.db.transaction("Failed to read cache entry", |tx| {
            tx.query_row(
                "SELECT key, data, timestamp FROM cache WHERE key = ?1",
                [key],
                row_to_entry,
            )
            .optional()
        })
    }

    /// Get every cached key, sorted.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` if the query fails.
    pub fn keys(&self) -> Result<Vec<String>, FieldlogError> {
        self.db.transaction("Failed to list cache keys", |tx| {
            let mut stmt = tx.prepare("SELECT key FROM cache ORDER BY key")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect()
        })
    }

    /// Get every entry, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` if the query fails.
    pub fn entries(&self) -> Result<Vec<CacheEntry>, FieldlogError> {
        self.db.transaction("Failed to list cache entries", |tx| {
            let mut stmt = tx.prepare("SELECT key, data, timestamp FROM cache ORDER BY key")?;
            let rows = stmt.query_map([], row_to_entry)?;
            rows.collect()
        })
    }

    /// Remove one entry. Returns `false` if it was not cached.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` if the delete fails.
    pub fn remove(&self, key: &str) -> Result<bool, FieldlogError> {
        let rows = self.db.transaction("Failed to remove cache entry", |tx| {
            tx.execute("DELETE FROM cache WHERE key = ?1", [key])
        })?;
        Ok(rows > 0)
    }

    /// Remove every entry. Returns how many were removed.
    ///
    /// Used on logout or account switch so one user's snapshots never show
    /// up in another's session.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` if the delete fails.
    pub fn clear(&self) -> Result<usize, FieldlogError> {
        let rows = self
            .db
            .transaction("Failed to clear cache", |tx| tx.execute("DELETE FROM cache", []))?;

        debug!(removed = rows, "Cleared cache");
        Ok(rows)
    }
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<CacheEntry> {
    let data: String = row.get(1)?;

    Ok(CacheEntry {
        key: row.get(0)?,
        data: serde_json::from_str(&data).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?,
        timestamp: row.get(2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_cache() -> CacheManager {
        CacheManager::with_database(Arc::new(Database::open_in_memory().unwrap()))
    }

    #[test]
    fn test_put_and_get() {
        let cache = create_test_cache();

        cache.put("reports", &json!([{"hours": 5}])).unwrap();
        assert_eq!(cache.get("reports").unwrap(), Some(json!([{"hours": 5}])));
    }

    #[test]
    fn test_last_write_wins() {
        let cache = create_test_cache();

        cache.put("goals", &json!({"v": "a"})).unwrap();
        cache.put("goals", &json!({"v": "b"})).unwrap();

        assert_eq!(cache.get("goals").unwrap(), Some(json!({"v": "b"})));
        assert_eq!(cache.entries().unwrap().len(), 1);
    }

    #[test]
    fn test_miss_is_not_an_error() {
        let cache = create_test_cache();

        assert_eq!(cache.get("absent-key").unwrap(), None);
        assert!(cache.entry("absent-key").unwrap().is_none());
        assert!(!cache.remove("absent-key").unwrap());
    }

    #[test]
    fn test_clear_is_total() {
        let cache = create_test_cache();
        let keys: Vec<String> = (0..10).map(|i| format!("key-{i}")).collect();

        for key in &keys {
            cache.put(key, &json!({"key": key})).unwrap();
        }

        assert_eq!(cache.clear().unwrap(), keys.len());
        for key in &keys {
            assert_eq!(cache.get(key).unwrap(), None);
        }
    }

    #[test]
    fn test_typed_round_trip() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Study {
            name: String,
            visits: u32,
        }

        let cache = create_test_cache();
        let study = Study {
            name: "Ana".to_string(),
            visits: 4,
        };
        cache.put("bibleStudies/ana", &study).unwrap();

        let loaded: Option<Study> = cache.get_as("bibleStudies/ana").unwrap();
        assert_eq!(loaded, Some(study));

        let mismatch: Result<Option<Vec<u32>>, _> = cache.get_as("bibleStudies/ana");
        assert!(matches!(mismatch, Err(FieldlogError::OperationFailed { .. })));
    }

    #[test]
    fn test_entry_timestamp_and_staleness() {
        let cache = create_test_cache();
        let before = Utc::now().timestamp_millis();
        cache.put("reports", &json!([])).unwrap();

        let entry = cache.entry("reports").unwrap().unwrap();
        assert!(entry.timestamp >= before);
        assert!(!entry.is_stale(Duration::minutes(5)));

        let old = CacheEntry {
            timestamp: before - Duration::hours(2).num_milliseconds(),
            ..entry
        };
        assert!(old.is_stale(Duration::hours(1)));
    }

    #[test]
    fn test_entries_sorted_by_key() {
        let cache = create_test_cache();
        cache.put("b", &1).unwrap();
        cache.put("a", &2).unwrap();

        let keys: Vec<String> = cache.entries().unwrap().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(cache.keys().unwrap(), keys);
    }
}
