//! Offline operation queue storage and management.
//!
//! Write-intents that could not reach the remote store are appended here and
//! read back by a drain, which removes each one on success or bumps its retry
//! count on failure. The queue never evicts on its own.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::operation::{Collection, OperationKind, QueuedOperation};
use crate::error::{BoxedCause, FieldlogError};
use crate::storage::{self, Database};

/// Default number of failed replays before an operation counts as exhausted.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

const SELECT_COLUMNS: &str = "SELECT id, type, collection, data, timestamp, retries FROM operations";

/// Durable queue of operations awaiting replay.
///
/// Cloning is cheap; clones share the same store.
#[derive(Debug, Clone)]
pub struct OperationQueue {
    db: Arc<Database>,
    max_retries: u32,
}

impl OperationQueue {
    /// Create a queue over the process-wide store.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the store cannot be opened.
    pub fn new() -> Result<Self, FieldlogError> {
        Ok(Self::with_database(storage::shared()?))
    }

    /// Create a queue over an existing store.
    #[must_use]
    pub const fn with_database(db: Arc<Database>) -> Self {
        Self {
            db,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Override the retry ceiling reported by [`Self::max_retries`].
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// The underlying store.
    #[must_use]
    pub const fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// The configured retry ceiling. Informational; nothing here enforces it.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Add an operation to the queue and return its new ID.
    ///
    /// Purely local: never waits on the network.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` if the store rejects the write.
    pub fn enqueue(
        &self,
        kind: OperationKind,
        collection: Collection,
        data: Value,
    ) -> Result<String, FieldlogError> {
        let operation = QueuedOperation::new(kind, collection, data);
        self.insert(&operation)?;

        debug!(
            id = %operation.id,
            kind = %kind,
            collection = %collection,
            "Queued operation"
        );
        Ok(operation.id)
    }

    /// Add an operation with a typed payload.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` if the payload cannot be serialized or the
    /// store rejects the write.
    pub fn enqueue_payload<T>(
        &self,
        kind: OperationKind,
        collection: Collection,
        payload: &T,
    ) -> Result<String, FieldlogError>
    where
        T: Serialize + ?Sized,
    {
        let data = serde_json::to_value(payload)
            .map_err(|e| FieldlogError::operation("Failed to serialize operation payload", e))?;
        self.enqueue(kind, collection, data)
    }

    pub(crate) fn insert(&self, operation: &QueuedOperation) -> Result<(), FieldlogError> {
        let data = serde_json::to_string(&operation.data)
            .map_err(|e| FieldlogError::operation("Failed to serialize operation payload", e))?;

        self.db.transaction("Failed to enqueue operation", |tx| {
            tx.execute(
                r"INSERT INTO operations (id, type, collection, data, timestamp, retries)
                  VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    operation.id,
                    operation.kind.as_str(),
                    operation.collection.as_str(),
                    data,
                    operation.timestamp,
                    operation.retries,
                ],
            )
            .map(|_| ())
        })
    }

    /// Get every queued operation in insertion order.
    ///
    /// Insertion order is not guaranteed to be chronological; callers that
    /// replay strictly by creation time should sort by `timestamp` first.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` if the query fails.
    pub fn list_pending(&self) -> Result<Vec<QueuedOperation>, FieldlogError> {
        self.db
            .transaction("Failed to list pending operations", |tx| {
                let mut stmt = tx.prepare(&format!("{SELECT_COLUMNS} ORDER BY rowid ASC"))?;
                let rows = stmt.query_map([], row_to_operation)?;
                rows.collect()
            })
    }

    /// Get the queued operations for one collection, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` if the query fails.
    pub fn list_pending_in(
        &self,
        collection: Collection,
    ) -> Result<Vec<QueuedOperation>, FieldlogError> {
        self.db
            .transaction("Failed to list pending operations", |tx| {
                let mut stmt = tx.prepare(&format!(
                    "{SELECT_COLUMNS} WHERE collection = ?1 ORDER BY rowid ASC"
                ))?;
                let rows = stmt.query_map([collection.as_str()], row_to_operation)?;
                rows.collect()
            })
    }

    /// Get operations that have reached the retry ceiling.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` if the query fails.
    pub fn exhausted(&self) -> Result<Vec<QueuedOperation>, FieldlogError> {
        self.db
            .transaction("Failed to list exhausted operations", |tx| {
                let mut stmt = tx.prepare(&format!(
                    "{SELECT_COLUMNS} WHERE retries >= ?1 ORDER BY rowid ASC"
                ))?;
                let rows = stmt.query_map([self.max_retries], row_to_operation)?;
                rows.collect()
            })
    }

    /// Get a specific operation by ID.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` if the query fails.
    pub fn get(&self, id: &str) -> Result<Option<QueuedOperation>, FieldlogError> {
        self.db.transaction("Failed to query operation", |tx| {
            tx.query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                [id],
                row_to_operation,
            )
            .optional()
        })
    }

    /// Delete an operation after a successful replay.
    ///
    /// Idempotent: returns `false` when the ID is already gone.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` if the delete fails.
    pub fn remove(&self, id: &str) -> Result<bool, FieldlogError> {
        let rows = self.db.transaction("Failed to remove operation", |tx| {
            tx.execute("DELETE FROM operations WHERE id = ?1", [id])
        })?;

        debug!(id, removed = rows > 0, "Removed operation");
        Ok(rows > 0)
    }

    /// Record one failed replay attempt.
    ///
    /// The increment is a single conditional update, so concurrent callers
    /// cannot lose each other's attempts. Returns `false` without error when
    /// the ID no longer exists.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` if the update fails.
    pub fn increment_retry(&self, id: &str) -> Result<bool, FieldlogError> {
        let rows = self.db.transaction("Failed to record retry", |tx| {
            tx.execute(
                "UPDATE operations SET retries = retries + 1 WHERE id = ?1",
                [id],
            )
        })?;

        debug!(id, found = rows > 0, "Recorded failed replay");
        Ok(rows > 0)
    }

    /// Get queue statistics.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` if the query fails.
    pub fn stats(&self) -> Result<QueueStats, FieldlogError> {
        self.db.transaction("Failed to read queue statistics", |tx| {
            let pending: i64 =
                tx.query_row("SELECT COUNT(*) FROM operations", [], |row| row.get(0))?;

            let exhausted: i64 = tx.query_row(
                "SELECT COUNT(*) FROM operations WHERE retries >= ?1",
                [self.max_retries],
                |row| row.get(0),
            )?;

            let oldest: Option<i64> =
                tx.query_row("SELECT MIN(timestamp) FROM operations", [], |row| row.get(0))?;

            let mut stmt = tx.prepare(
                "SELECT collection, COUNT(*) FROM operations GROUP BY collection ORDER BY collection",
            )?;
            let by_collection = stmt
                .query_map([], |row| {
                    let name: String = row.get(0)?;
                    let collection = name
                        .parse::<Collection>()
                        .map_err(|e| conversion_error(0, e))?;
                    Ok((collection, row.get::<_, i64>(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(QueueStats {
                pending,
                exhausted,
                max_retries: self.max_retries,
                oldest_pending: oldest.and_then(DateTime::from_timestamp_millis),
                by_collection,
            })
        })
    }

    /// Delete every queued operation. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` if the delete fails.
    pub fn clear(&self) -> Result<usize, FieldlogError> {
        let rows = self.db.transaction("Failed to clear queue", |tx| {
            tx.execute("DELETE FROM operations", [])
        })?;

        debug!(removed = rows, "Cleared operation queue");
        Ok(rows)
    }
}

/// Queue statistics.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    /// Number of queued operations
    pub pending: i64,
    /// Number of operations at or past the retry ceiling
    pub exhausted: i64,
    /// Retry ceiling used for `exhausted`
    pub max_retries: u32,
    /// Oldest queued operation
    pub oldest_pending: Option<DateTime<Utc>>,
    /// Queued operations per collection
    pub by_collection: Vec<(Collection, i64)>,
}

fn row_to_operation(row: &Row<'_>) -> rusqlite::Result<QueuedOperation> {
    let kind: String = row.get(1)?;
    let collection: String = row.get(2)?;
    let data: String = row.get(3)?;

    Ok(QueuedOperation {
        id: row.get(0)?,
        kind: kind.parse().map_err(|e| conversion_error(1, e))?,
        collection: collection.parse().map_err(|e| conversion_error(2, e))?,
        data: serde_json::from_str(&data).map_err(|e| conversion_error(3, e))?,
        timestamp: row.get(4)?,
        retries: row.get(5)?,
    })
}

fn conversion_error<E: Into<BoxedCause>>(column: usize, err: E) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, err.into())
}
