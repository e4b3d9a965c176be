//! Offline operation queue.
//!
//! Write-intents that cannot reach the remote store are buffered here and
//! replayed later.
//!
//! Features:
//! - Durable FIFO queue keyed by generated operation IDs
//! - Retry accounting against a configurable ceiling
//! - Single-flight drain that replays oldest first
//! - Write-through helper that falls back to the queue

pub mod executor;
pub mod operation;
pub mod queue;

pub use executor::{
    submit, DrainConfig, DrainEntry, DrainOutcome, DrainReport, Drainer, RemoteStore, Submission,
};
pub use operation::{sort_chronologically, Collection, OperationKind, QueuedOperation};
pub use queue::{OperationQueue, QueueStats, DEFAULT_MAX_RETRIES};
