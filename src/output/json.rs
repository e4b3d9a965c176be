//! JSON output formatting for fieldlog.

use chrono::Duration;
use serde::Serialize;
use serde_json::json;

use crate::error::FieldlogError;
use crate::features::cache::CacheEntry;
use crate::features::sync::QueuedOperation;

/// Format queued operations as JSON
///
/// # Errors
///
/// Returns `FieldlogError::Parse` if JSON serialization fails.
pub fn format_operations_json(
    operations: &[QueuedOperation],
    list_name: &str,
) -> Result<String, FieldlogError> {
    let output = json!({
        "list": list_name,
        "count": operations.len(),
        "items": operations
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format cache entries as JSON, each tagged with its staleness
///
/// # Errors
///
/// Returns `FieldlogError::Parse` if JSON serialization fails.
pub fn format_cache_entries_json(
    entries: &[CacheEntry],
    stale_after: Duration,
) -> Result<String, FieldlogError> {
    let items: Vec<_> = entries
        .iter()
        .map(|entry| cache_entry_value(entry, stale_after))
        .collect();

    let output = json!({
        "count": entries.len(),
        "items": items
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format a single cache entry as JSON
///
/// # Errors
///
/// Returns `FieldlogError::Parse` if JSON serialization fails.
pub fn format_cache_entry_json(
    entry: &CacheEntry,
    stale_after: Duration,
) -> Result<String, FieldlogError> {
    Ok(serde_json::to_string_pretty(&cache_entry_value(entry, stale_after))?)
}

fn cache_entry_value(entry: &CacheEntry, stale_after: Duration) -> serde_json::Value {
    json!({
        "key": entry.key,
        "data": entry.data,
        "timestamp": entry.timestamp,
        "cached_at": entry.cached_at().to_rfc3339(),
        "stale": entry.is_stale(stale_after),
    })
}

/// Generic JSON formatter for any serializable type
///
/// # Errors
///
/// Returns `FieldlogError::Parse` if JSON serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, FieldlogError> {
    Ok(serde_json::to_string_pretty(value)?)
}
