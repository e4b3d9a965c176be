//! Drain executor for replaying queued operations.
//!
//! Replays the queue against the remote store oldest first, removing each
//! operation on success and recording a retry on failure. At most one drain
//! runs per `Database` handle at a time; share one handle (see
//! `storage::shared`) for process-wide single-flight.
//!
//! Delivery is at-least-once: if the process dies between a successful
//! replay and the removal, the operation is replayed again next time.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::operation::{sort_chronologically, Collection, OperationKind, QueuedOperation};
use super::queue::OperationQueue;
use crate::core::Connectivity;
use crate::error::FieldlogError;

/// The remote document store that queued operations are replayed against.
#[cfg_attr(test, mockall::automock)]
pub trait RemoteStore {
    /// Apply one create, update or delete to `operation.collection`.
    ///
    /// # Errors
    ///
    /// Any error counts as a failed replay.
    fn apply(&self, operation: &QueuedOperation) -> Result<(), FieldlogError>;
}

/// Configuration for a drain.
#[derive(Debug, Clone)]
pub struct DrainConfig {
    /// Failed replays after which an operation is no longer attempted
    pub max_retries: u32,
    /// Whether to stop on the first failed replay
    pub stop_on_error: bool,
    /// Dry run mode (don't contact the remote store)
    pub dry_run: bool,
    /// Remove exhausted operations instead of leaving them queued
    pub drop_exhausted: bool,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            max_retries: super::queue::DEFAULT_MAX_RETRIES,
            stop_on_error: false,
            dry_run: false,
            drop_exhausted: false,
        }
    }
}

/// What happened to one operation during a drain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Replayed and removed from the queue
    Applied,
    /// Replay failed; retry count incremented
    Failed(String),
    /// Not attempted (dry run, or exhausted and kept)
    Skipped,
    /// Exhausted and removed without replay
    Dropped,
}

/// Result of draining a single operation.
#[derive(Debug, Clone)]
pub struct DrainEntry {
    /// Operation ID
    pub id: String,
    /// Mutation kind
    pub kind: OperationKind,
    /// Target collection
    pub collection: Collection,
    /// What happened
    pub outcome: DrainOutcome,
}

/// Result of a whole drain.
#[derive(Debug, Default)]
pub struct DrainReport {
    /// Operations replayed successfully
    pub succeeded: usize,
    /// Operations whose replay failed
    pub failed: usize,
    /// Operations left untouched
    pub skipped: usize,
    /// Exhausted operations removed
    pub dropped: usize,
    /// Individual results, in replay order
    pub entries: Vec<DrainEntry>,
}

impl DrainReport {
    fn add(&mut self, entry: DrainEntry) {
        match entry.outcome {
            DrainOutcome::Applied => self.succeeded += 1,
            DrainOutcome::Failed(_) => self.failed += 1,
            DrainOutcome::Skipped => self.skipped += 1,
            DrainOutcome::Dropped => self.dropped += 1,
        }
        self.entries.push(entry);
    }

    /// Check if no replay failed.
    #[must_use]
    pub const fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Get total operations processed.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped + self.dropped
    }
}

/// Replays the operation queue against a remote store.
pub struct Drainer<'a, R: RemoteStore + ?Sized> {
    remote: &'a R,
    queue: &'a OperationQueue,
    config: DrainConfig,
}

impl<'a, R: RemoteStore + ?Sized> Drainer<'a, R> {
    /// Create a drainer using the queue's retry ceiling.
    #[must_use]
    pub fn new(remote: &'a R, queue: &'a OperationQueue) -> Self {
        let config = DrainConfig {
            max_retries: queue.max_retries(),
            ..DrainConfig::default()
        };
        Self::with_config(remote, queue, config)
    }

    /// Create a drainer with custom config.
    #[must_use]
    pub const fn with_config(remote: &'a R, queue: &'a OperationQueue, config: DrainConfig) -> Self {
        Self {
            remote,
            queue,
            config,
        }
    }

    /// Replay every queued operation, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DrainInProgress` if another drain holds the store's lease, or
    /// a storage error if the queue cannot be read. A storage error partway
    /// through returns `DrainInterrupted` carrying the outcomes so far.
    pub fn drain(&self) -> Result<DrainReport, FieldlogError> {
        let db = self.queue.database();
        let Some(_lease) = db.try_lock_drain() else {
            return Err(FieldlogError::DrainInProgress);
        };

        let mut pending = self.queue.list_pending()?;
        sort_chronologically(&mut pending);

        let mut report = DrainReport::default();
        for operation in pending {
            let outcome = match self.replay(&operation) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(
                        id = %operation.id,
                        succeeded = report.succeeded,
                        failed = report.failed,
                        error = %e,
                        "Drain interrupted"
                    );
                    return Err(FieldlogError::DrainInterrupted {
                        report: Box::new(report),
                        source: Box::new(e),
                    });
                }
            };
            let stop = matches!(outcome, DrainOutcome::Failed(_)) && self.config.stop_on_error;

            report.add(DrainEntry {
                id: operation.id,
                kind: operation.kind,
                collection: operation.collection,
                outcome,
            });

            if stop {
                break;
            }
        }

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            dropped = report.dropped,
            "Drain finished"
        );
        Ok(report)
    }

    fn replay(&self, operation: &QueuedOperation) -> Result<DrainOutcome, FieldlogError> {
        if operation.is_exhausted(self.config.max_retries) {
            warn!(
                id = %operation.id,
                retries = operation.retries,
                "Operation exhausted its retries"
            );
            if self.config.drop_exhausted && !self.config.dry_run {
                self.queue.remove(&operation.id)?;
                return Ok(DrainOutcome::Dropped);
            }
            return Ok(DrainOutcome::Skipped);
        }

        if self.config.dry_run {
            return Ok(DrainOutcome::Skipped);
        }

        match self.remote.apply(operation) {
            Ok(()) => {
                self.queue.remove(&operation.id)?;
                debug!(id = %operation.id, "Replayed operation");
                Ok(DrainOutcome::Applied)
            }
            Err(e) => {
                let message = e.to_string();
                warn!(id = %operation.id, error = %message, "Replay failed");
                self.queue.increment_retry(&operation.id)?;
                Ok(DrainOutcome::Failed(message))
            }
        }
    }
}

/// Outcome of [`submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Written to the remote store directly
    Applied,
    /// Deferred to the queue under this ID
    Queued(String),
}

/// Write through to the remote store, falling back to the queue.
///
/// When online the remote is tried first and the operation is queued only if
/// that fails. When offline it goes straight to the queue.
///
/// # Errors
///
/// Returns a storage error if the operation had to be queued and the queue
/// rejected it.
pub fn submit<R: RemoteStore + ?Sized>(
    remote: &R,
    queue: &OperationQueue,
    connectivity: Connectivity,
    kind: OperationKind,
    collection: Collection,
    data: Value,
) -> Result<Submission, FieldlogError> {
    let operation = QueuedOperation::new(kind, collection, data);

    if connectivity.is_online() {
        match remote.apply(&operation) {
            Ok(()) => return Ok(Submission::Applied),
            Err(e) => warn!(id = %operation.id, error = %e, "Remote write failed, queueing"),
        }
    }

    queue.insert(&operation)?;
    debug!(id = %operation.id, "Deferred operation to queue");
    Ok(Submission::Queued(operation.id))
}
