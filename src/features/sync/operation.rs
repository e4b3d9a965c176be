//! Operation types for the offline queue.
//!
//! Defines the write-intents that can be queued and the collections they
//! target.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FieldlogError;

/// Mutation kind intended for the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Create a document
    Create,
    /// Update a document
    Update,
    /// Delete a document
    Delete,
}

impl OperationKind {
    /// Stored and wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = FieldlogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            _ => Err(FieldlogError::Config(format!(
                "Unknown operation type: {s} (expected create, update or delete)"
            ))),
        }
    }
}

/// Logical target collection in the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    /// Monthly service reports
    Reports,
    /// Bible study records
    BibleStudies,
    /// Personal goals
    Goals,
}

impl Collection {
    /// Every known collection.
    pub const ALL: [Self; 3] = [Self::Reports, Self::BibleStudies, Self::Goals];

    /// Stored and wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Reports => "reports",
            Self::BibleStudies => "bibleStudies",
            Self::Goals => "goals",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = FieldlogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reports" => Ok(Self::Reports),
            "biblestudies" | "bible-studies" | "bible_studies" => Ok(Self::BibleStudies),
            "goals" => Ok(Self::Goals),
            _ => Err(FieldlogError::Config(format!(
                "Unknown collection: {s} (expected reports, bibleStudies or goals)"
            ))),
        }
    }
}

/// A write-intent waiting to be replayed against the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedOperation {
    /// Unique ID: `<epoch millis>-<random base36>`
    pub id: String,
    /// Mutation kind
    #[serde(rename = "type")]
    pub kind: OperationKind,
    /// Target collection
    pub collection: Collection,
    /// Document fields to write, or the identifier to delete
    pub data: Value,
    /// Creation time in milliseconds since the epoch
    pub timestamp: i64,
    /// Failed replay attempts so far
    pub retries: u32,
}

impl QueuedOperation {
    /// Create a fresh pending operation stamped with the current time.
    #[must_use]
    pub fn new(kind: OperationKind, collection: Collection, data: Value) -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            id: generate_id(now),
            kind,
            collection,
            data,
            timestamp: now,
            retries: 0,
        }
    }

    /// Whether the operation has used up its replay attempts.
    #[must_use]
    pub const fn is_exhausted(&self, max_retries: u32) -> bool {
        self.retries >= max_retries
    }

    /// Creation time.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or_default()
    }

    /// Identifier of the remote document this operation targets, if known.
    ///
    /// Deletes may carry the bare id as their payload; other kinds carry an
    /// `id` field when they address an existing document.
    #[must_use]
    pub fn target_id(&self) -> Option<String> {
        match &self.data {
            Value::String(id) => Some(id.clone()),
            Value::Object(fields) => fields.get("id").and_then(Value::as_str).map(String::from),
            _ => None,
        }
    }
}

/// Sort operations oldest first.
///
/// The sort is stable, so operations created in the same millisecond keep
/// their insertion order.
pub fn sort_chronologically(operations: &mut [QueuedOperation]) {
    operations.sort_by_key(|op| op.timestamp);
}

const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn generate_id(now_millis: i64) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect();
    format!("{now_millis}-{suffix}")
}
