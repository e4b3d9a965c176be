//! Output formatting for fieldlog.
//!
//! This module provides formatters for displaying queued operations and
//! cached snapshots in various formats.

mod json;
mod pretty;

use chrono::Duration;

use crate::cli::args::OutputFormat;
use crate::error::FieldlogError;
use crate::features::cache::CacheEntry;
use crate::features::sync::{QueueStats, QueuedOperation};

pub use json::*;
pub use pretty::*;

/// Format queued operations based on output format
///
/// # Errors
///
/// Returns `FieldlogError::Parse` if JSON serialization fails.
pub fn format_operations(
    operations: &[QueuedOperation],
    title: &str,
    max_retries: u32,
    format: OutputFormat,
) -> Result<String, FieldlogError> {
    match format {
        OutputFormat::Pretty => Ok(format_operations_pretty(operations, title, max_retries)),
        OutputFormat::Json => format_operations_json(operations, title),
    }
}

/// Format a single queued operation based on output format
///
/// # Errors
///
/// Returns `FieldlogError::Parse` if JSON serialization fails.
pub fn format_operation(
    operation: &QueuedOperation,
    max_retries: u32,
    format: OutputFormat,
) -> Result<String, FieldlogError> {
    match format {
        OutputFormat::Pretty => Ok(format_operation_pretty(operation, max_retries)),
        OutputFormat::Json => to_json(operation),
    }
}

/// Format queue statistics based on output format
///
/// # Errors
///
/// Returns `FieldlogError::Parse` if JSON serialization fails.
pub fn format_stats(stats: &QueueStats, format: OutputFormat) -> Result<String, FieldlogError> {
    match format {
        OutputFormat::Pretty => Ok(format_stats_pretty(stats)),
        OutputFormat::Json => to_json(stats),
    }
}

/// Format cache entries based on output format
///
/// # Errors
///
/// Returns `FieldlogError::Parse` if JSON serialization fails.
pub fn format_cache_entries(
    entries: &[CacheEntry],
    stale_after: Duration,
    format: OutputFormat,
) -> Result<String, FieldlogError> {
    match format {
        OutputFormat::Pretty => Ok(format_cache_entries_pretty(entries, stale_after)),
        OutputFormat::Json => format_cache_entries_json(entries, stale_after),
    }
}

/// Format a single cache entry based on output format
///
/// # Errors
///
/// Returns `FieldlogError::Parse` if JSON serialization fails.
pub fn format_cache_entry(
    entry: &CacheEntry,
    stale_after: Duration,
    format: OutputFormat,
) -> Result<String, FieldlogError> {
    match format {
        OutputFormat::Pretty => Ok(format_cache_entry_pretty(entry, stale_after)),
        OutputFormat::Json => format_cache_entry_json(entry, stale_after),
    }
}
