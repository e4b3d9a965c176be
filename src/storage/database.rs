//! `SQLite` store connection and transactions.
//!
//! The store lives at `~/.fieldlog/fieldlog.db` and holds two record sets:
//! - `operations`: the offline operation queue
//! - `cache`: last-known-good read snapshots

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use once_cell::sync::OnceCell;
use rusqlite::{Connection, Transaction};

use crate::config::Paths;
use crate::error::FieldlogError;

use super::migrations;

/// Held for the duration of a drain; see [`Database::try_lock_drain`].
pub type DrainLease<'a> = MutexGuard<'a, ()>;

static SHARED: OnceCell<Arc<Database>> = OnceCell::new();

/// Get the process-wide store, opening it on first use.
///
/// Concurrent first callers block on a single open. A failed open is not
/// remembered, so the next call tries again.
///
/// # Errors
///
/// Returns `StorageUnavailable` if the store cannot be opened.
pub fn shared() -> Result<Arc<Database>, FieldlogError> {
    init_shared(&SHARED, Database::open)
}

fn init_shared<F>(cell: &OnceCell<Arc<Database>>, open: F) -> Result<Arc<Database>, FieldlogError>
where
    F: FnOnce() -> Result<Database, FieldlogError>,
{
    cell.get_or_try_init(|| open().map(Arc::new)).map(Arc::clone)
}

/// Store connection wrapper.
///
/// One connection, serialized behind a mutex. Every call runs inside its own
/// transaction; nothing spans two calls.
#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
    drain: Mutex<()>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open the store at the default location.
    ///
    /// Creates the database file and runs migrations if necessary.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the store cannot be opened or migrated.
    pub fn open() -> Result<Self, FieldlogError> {
        let paths = Paths::new().map_err(|e| FieldlogError::StorageUnavailable(e.to_string()))?;
        paths
            .ensure_dirs()
            .map_err(|e| FieldlogError::StorageUnavailable(e.to_string()))?;
        Self::open_at(&paths.database)
    }

    /// Open the store at a specific path.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the store cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, FieldlogError> {
        let conn = Connection::open(path).map_err(|e| {
            FieldlogError::StorageUnavailable(format!(
                "Failed to open database {}: {e}",
                path.display()
            ))
        })?;

        // WAL with full sync: a committed transaction survives a crash
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = FULL;")
            .map_err(|e| {
                FieldlogError::StorageUnavailable(format!("Failed to configure database: {e}"))
            })?;

        let db = Self::init(conn, Some(path.to_path_buf()))?;
        tracing::info!(path = %path.display(), "Opened local store");
        Ok(db)
    }

    /// Open an in-memory store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the store cannot be opened or migrated.
    pub fn open_in_memory() -> Result<Self, FieldlogError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            FieldlogError::StorageUnavailable(format!("Failed to open in-memory database: {e}"))
        })?;

        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self, FieldlogError> {
        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            drain: Mutex::new(()),
            path,
        })
    }

    /// Get the current schema version.
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be read.
    pub fn schema_version(&self) -> Result<i32, FieldlogError> {
        let conn = self.lock("Failed to read schema version")?;
        migrations::get_version(&conn)
    }

    /// File backing this store, `None` for in-memory stores.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` inside a single transaction.
    ///
    /// The transaction commits if `f` succeeds and rolls back otherwise, so
    /// callers never observe a partially written record.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` carrying `context` and the `SQLite` cause.
    pub fn transaction<T, F>(&self, context: &str, f: F) -> Result<T, FieldlogError>
    where
        F: FnOnce(&Transaction<'_>) -> rusqlite::Result<T>,
    {
        let mut conn = self.lock(context)?;

        let tx = conn
            .transaction()
            .map_err(|e| FieldlogError::operation(context, e))?;
        let value = f(&tx).map_err(|e| FieldlogError::operation(context, e))?;
        tx.commit().map_err(|e| FieldlogError::operation(context, e))?;

        Ok(value)
    }

    /// Take the single-flight drain lease without blocking.
    ///
    /// Returns `None` while another drain holds it. The lease is released
    /// when the returned guard is dropped.
    ///
    /// The lease belongs to this handle, not to the file: two handles opened
    /// separately on the same path do not exclude each other. Share one
    /// handle (see [`shared`]) for process-wide single-flight.
    #[must_use]
    pub fn try_lock_drain(&self) -> Option<DrainLease<'_>> {
        match self.drain.try_lock() {
            Ok(guard) => Some(guard),
            // A panicked drain leaves no state behind the lock
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    fn lock(&self, context: &str) -> Result<MutexGuard<'_, Connection>, FieldlogError> {
        self.conn
            .lock()
            .map_err(|e| FieldlogError::operation(context, format!("Lock poisoned: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.schema_version().unwrap(), migrations::CURRENT_VERSION);
        assert!(db.path().is_none());
    }

    #[test]
    fn test_open_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db = Database::open_at(&db_path).unwrap();
        assert!(db.schema_version().unwrap() > 0);
        assert!(db_path.exists());
        assert_eq!(db.path(), Some(db_path.as_path()));
    }

    #[test]
    fn test_open_missing_directory_is_unavailable() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("missing").join("test.db");

        let err = Database::open_at(&db_path).unwrap_err();
        assert!(err.is_storage_unavailable());
    }

    #[test]
    fn test_reopen_keeps_records() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        {
            let db = Database::open_at(&db_path).unwrap();
            db.transaction("insert", |tx| {
                tx.execute(
                    "INSERT INTO cache (key, data, timestamp) VALUES ('k', '1', 1)",
                    [],
                )
            })
            .unwrap();
        }

        let db = Database::open_at(&db_path).unwrap();
        let count: i64 = db
            .transaction("count", |tx| {
                tx.query_row("SELECT COUNT(*) FROM cache", [], |row| row.get(0))
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_failed_transaction_rolls_back() {
        let db = Database::open_in_memory().unwrap();

        let result = db.transaction("partial write", |tx| {
            tx.execute(
                "INSERT INTO cache (key, data, timestamp) VALUES ('a', '1', 1)",
                [],
            )?;
            // Violates NOT NULL, aborting the whole transaction
            tx.execute(
                "INSERT INTO cache (key, data, timestamp) VALUES ('b', NULL, 1)",
                [],
            )
        });

        let err = result.unwrap_err();
        assert!(matches!(err, FieldlogError::OperationFailed { .. }));

        let count: i64 = db
            .transaction("count", |tx| {
                tx.query_row("SELECT COUNT(*) FROM cache", [], |row| row.get(0))
            })
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_drain_lease_is_exclusive() {
        let db = Database::open_in_memory().unwrap();

        let lease = db.try_lock_drain();
        assert!(lease.is_some());
        assert!(db.try_lock_drain().is_none());

        drop(lease);
        assert!(db.try_lock_drain().is_some());
    }

    #[test]
    fn test_drain_lease_shared_across_clones() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let other = Arc::clone(&db);

        let lease = db.try_lock_drain();
        assert!(lease.is_some());
        assert!(other.try_lock_drain().is_none());
    }

    #[test]
    fn test_failed_shared_open_is_retried() {
        let cell = OnceCell::new();

        let err = init_shared(&cell, || {
            Err(FieldlogError::StorageUnavailable("disk full".to_string()))
        })
        .unwrap_err();
        assert!(err.is_storage_unavailable());
        assert!(cell.get().is_none());

        let db = init_shared(&cell, Database::open_in_memory).unwrap();
        assert!(Arc::ptr_eq(&db, cell.get().unwrap()));
    }

    #[test]
    fn test_shared_open_runs_once() {
        let cell = OnceCell::new();
        let opens = AtomicUsize::new(0);

        let handles: Vec<Arc<Database>> = std::thread::scope(|s| {
            let workers: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        init_shared(&cell, || {
                            opens.fetch_add(1, Ordering::SeqCst);
                            Database::open_in_memory()
                        })
                        .unwrap()
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        assert_eq!(opens.load(Ordering::SeqCst), 1);
        assert!(handles.iter().all(|db| Arc::ptr_eq(db, &handles[0])));
    }
}
