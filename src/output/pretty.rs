use chrono::Duration;
use colored::Colorize;

use crate::features::cache::CacheEntry;
use crate::features::sync::{QueueStats, QueuedOperation};

const PREVIEW_LEN: usize = 40;

/// Format queued operations as a pretty table
pub fn format_operations_pretty(
    operations: &[QueuedOperation],
    title: &str,
    max_retries: u32,
) -> String {
    if operations.is_empty() {
        return format!("{title} (0 items)\n  No operations queued");
    }

    let mut output = format!("{} ({} items)\n", title, operations.len());
    output.push_str(&"─".repeat(72));
    output.push('\n');
    output.push_str(&format!(
        "{:<24} {:<7} {:<13} {:<17} {}\n",
        "ID", "Type", "Collection", "Created", "Retries"
    ));
    output.push_str(&"─".repeat(72));
    output.push('\n');

    for op in operations {
        let retries = format!("{}/{}", op.retries, max_retries);
        let retries = if op.is_exhausted(max_retries) {
            retries.red().to_string()
        } else if op.retries > 0 {
            retries.yellow().to_string()
        } else {
            retries
        };

        output.push_str(&format!(
            "{:<24} {:<7} {:<13} {:<17} {}\n",
            op.id,
            op.kind.as_str(),
            op.collection.as_str(),
            op.created_at().format("%Y-%m-%d %H:%M").to_string(),
            retries
        ));
    }

    output
}

/// Format a single queued operation as pretty output
pub fn format_operation_pretty(op: &QueuedOperation, max_retries: u32) -> String {
    let mut output = format!("{} {}\n", op.kind.as_str().bold(), op.collection);
    output.push_str(&format!("  {}: {}\n", "ID".dimmed(), op.id));
    output.push_str(&format!(
        "  {}: {}\n",
        "Created".dimmed(),
        op.created_at().format("%Y-%m-%d %H:%M:%S")
    ));

    let retries = format!("{}/{}", op.retries, max_retries);
    if op.is_exhausted(max_retries) {
        output.push_str(&format!(
            "  {}: {} {}\n",
            "Retries".dimmed(),
            retries.red(),
            "(exhausted)".red()
        ));
    } else {
        output.push_str(&format!("  {}: {}\n", "Retries".dimmed(), retries));
    }

    if let Some(target) = op.target_id() {
        output.push_str(&format!("  {}: {}\n", "Target".dimmed(), target));
    }

    let data = serde_json::to_string_pretty(&op.data).unwrap_or_else(|_| op.data.to_string());
    output.push_str(&format!("  {}:\n", "Data".dimmed()));
    for line in data.lines() {
        output.push_str(&format!("    {line}\n"));
    }

    output
}

/// Format queue statistics as pretty output
pub fn format_stats_pretty(stats: &QueueStats) -> String {
    let mut lines = Vec::new();

    lines.push("Operation Queue Status".bold().to_string());
    lines.push("─".repeat(40));

    lines.push(format!(
        "  Pending:    {} {}",
        stats.pending,
        if stats.pending > 0 {
            "operations waiting".dimmed()
        } else {
            "".dimmed()
        }
    ));

    lines.push(format!(
        "  Exhausted:  {} {}",
        stats.exhausted,
        if stats.exhausted > 0 {
            format!("reached {} retries", stats.max_retries).red()
        } else {
            "".normal()
        }
    ));

    if let Some(oldest) = stats.oldest_pending {
        let age = chrono::Utc::now().signed_duration_since(oldest);
        lines.push(format!("  Oldest:     {}", format_age(age).dimmed()));
    }

    if !stats.by_collection.is_empty() {
        lines.push(String::new());
        for (collection, count) in &stats.by_collection {
            lines.push(format!("  {:<13} {}", collection.as_str(), count));
        }
    }

    lines.join("\n")
}

/// Format cache entries as a pretty table
pub fn format_cache_entries_pretty(entries: &[CacheEntry], stale_after: Duration) -> String {
    if entries.is_empty() {
        return "Cache (0 entries)\n  Nothing cached".to_string();
    }

    let mut output = format!("Cache ({} entries)\n", entries.len());
    output.push_str(&"─".repeat(60));
    output.push('\n');

    for entry in entries {
        // Pad before colorizing; escape codes defeat width specifiers
        let key = format!("{:<24}", entry.key).bold();
        let age = format_age(entry.age());
        let age = if entry.is_stale(stale_after) {
            let age = format!("{age} (stale)");
            format!("{age:<22}").yellow()
        } else {
            format!("{age:<22}").dimmed()
        };

        output.push_str(&format!(
            "{key} {age} {}\n",
            preview(&entry.data.to_string()).dimmed()
        ));
    }

    output
}

/// Format a single cache entry as pretty output
pub fn format_cache_entry_pretty(entry: &CacheEntry, stale_after: Duration) -> String {
    let mut output = format!("{}\n", entry.key.bold());

    let cached = format!(
        "{} ({})",
        entry.cached_at().format("%Y-%m-%d %H:%M:%S"),
        format_age(entry.age())
    );
    if entry.is_stale(stale_after) {
        output.push_str(&format!("  {}: {}\n", "Cached".dimmed(), cached.yellow()));
    } else {
        output.push_str(&format!("  {}: {}\n", "Cached".dimmed(), cached));
    }

    let data =
        serde_json::to_string_pretty(&entry.data).unwrap_or_else(|_| entry.data.to_string());
    output.push_str(&format!("  {}:\n", "Data".dimmed()));
    for line in data.lines() {
        output.push_str(&format!("    {line}\n"));
    }

    output
}

/// Describe an age relative to now
pub fn format_age(age: Duration) -> String {
    if age.num_days() > 0 {
        format!("{} days ago", age.num_days())
    } else if age.num_hours() > 0 {
        format!("{} hours ago", age.num_hours())
    } else if age.num_minutes() > 0 {
        format!("{} minutes ago", age.num_minutes())
    } else {
        "just now".to_string()
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_LEN {
        let cut: String = text.chars().take(PREVIEW_LEN - 3).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}
