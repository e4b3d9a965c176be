//! Error types for fieldlog.

use thiserror::Error;

use crate::features::sync::DrainReport;

/// Boxed underlying cause, kept for logging.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in fieldlog operations.
///
/// A missing key or operation id is never an error: lookups return `None`
/// and removals report `false`.
#[derive(Debug, Error)]
pub enum FieldlogError {
    /// The local store could not be opened or migrated.
    ///
    /// Callers should degrade to running without offline support.
    #[error("Local storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A single read or write against the store failed.
    ///
    /// Safe to retry the same call or abandon the record.
    #[error("Storage operation failed: {context}")]
    OperationFailed {
        /// What was being attempted.
        context: String,
        /// The underlying cause.
        #[source]
        source: BoxedCause,
    },

    /// Another drain already holds the single-flight lease.
    #[error("A drain is already in progress")]
    DrainInProgress,

    /// A drain stopped on a storage error partway through.
    ///
    /// `report` holds what was done before the failure; those operations are
    /// already replayed and removed.
    #[error("Drain interrupted after {} operations", report.total())]
    DrainInterrupted {
        /// Outcomes recorded before the failure.
        report: Box<DrainReport>,
        /// The storage error that stopped the drain.
        #[source]
        source: Box<FieldlogError>,
    },

    /// The remote store rejected a replayed operation.
    #[error("Remote store error: {0}")]
    Remote(String),

    /// Configuration or argument error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse or format error.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl FieldlogError {
    /// Wrap a per-call failure, preserving its cause.
    pub fn operation<E>(context: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxedCause>,
    {
        Self::OperationFailed {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Whether the store itself is unusable, as opposed to a single call failing.
    #[must_use]
    pub const fn is_storage_unavailable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_operation_failed_keeps_source() {
        let err = FieldlogError::operation(
            "Failed to enqueue operation",
            rusqlite::Error::QueryReturnedNoRows,
        );

        assert_eq!(
            err.to_string(),
            "Storage operation failed: Failed to enqueue operation"
        );
        assert!(err.source().is_some());
        assert!(!err.is_storage_unavailable());
    }

    #[test]
    fn test_storage_unavailable() {
        let err = FieldlogError::StorageUnavailable("disk is read-only".to_string());
        assert!(err.is_storage_unavailable());
        assert!(err.to_string().contains("disk is read-only"));
    }

    #[test]
    fn test_drain_interrupted_keeps_cause() {
        let err = FieldlogError::DrainInterrupted {
            report: Box::default(),
            source: Box::new(FieldlogError::Remote("gone".to_string())),
        };

        assert_eq!(err.to_string(), "Drain interrupted after 0 operations");
        assert!(err.source().unwrap().to_string().contains("gone"));
    }
}
