//! Operation queue command implementation.
//!
//! Handles queue inspection and maintenance commands.

use colored::Colorize;
use serde_json::json;

use crate::cli::args::{OutputFormat, QueueCommands};
use crate::error::FieldlogError;
use crate::features::sync::{
    sort_chronologically, Collection, OperationKind, OperationQueue,
};
use crate::output::{format_operation, format_operations, format_stats, to_json};

/// Execute queue subcommands.
///
/// # Errors
///
/// Returns an error if the store call fails, the payload is not valid JSON,
/// or output formatting fails.
pub fn queue(
    queue: &OperationQueue,
    cmd: QueueCommands,
    format: OutputFormat,
) -> Result<String, FieldlogError> {
    match cmd {
        QueueCommands::Status => format_stats(&queue.stats()?, format),
        QueueCommands::List {
            collection,
            chronological,
        } => list_operations(queue, collection, chronological, format),
        QueueCommands::Show { id } => show_operation(queue, &id, format),
        QueueCommands::Add {
            kind,
            collection,
            data,
        } => add_operation(queue, kind, collection, &data, format),
        QueueCommands::Remove { id } => remove_operation(queue, &id, format),
        QueueCommands::Fail { id } => record_failure(queue, &id, format),
        QueueCommands::Purge {
            exhausted,
            all,
            force,
        } => purge_operations(queue, exhausted, all, force, format),
    }
}

/// List queued operations.
fn list_operations(
    queue: &OperationQueue,
    collection: Option<Collection>,
    chronological: bool,
    format: OutputFormat,
) -> Result<String, FieldlogError> {
    let mut operations = match collection {
        Some(collection) => queue.list_pending_in(collection)?,
        None => queue.list_pending()?,
    };

    if chronological {
        sort_chronologically(&mut operations);
    }

    let title = collection.map_or_else(
        || "Queued operations".to_string(),
        |c| format!("Queued {c} operations"),
    );

    format_operations(&operations, &title, queue.max_retries(), format)
}

/// Show one operation.
fn show_operation(
    queue: &OperationQueue,
    id: &str,
    format: OutputFormat,
) -> Result<String, FieldlogError> {
    match queue.get(id)? {
        Some(operation) => format_operation(&operation, queue.max_retries(), format),
        None => match format {
            OutputFormat::Json => to_json(&serde_json::Value::Null),
            OutputFormat::Pretty => Ok(format!("Operation {id} is not queued")),
        },
    }
}

/// Add an operation to the queue.
fn add_operation(
    queue: &OperationQueue,
    kind: OperationKind,
    collection: Collection,
    data: &str,
    format: OutputFormat,
) -> Result<String, FieldlogError> {
    let data: serde_json::Value = serde_json::from_str(data)?;
    let id = queue.enqueue(kind, collection, data)?;

    match format {
        OutputFormat::Json => to_json(&json!({
            "id": id,
            "type": kind,
            "collection": collection,
        })),
        OutputFormat::Pretty => Ok(format!("Queued {kind} on {collection} (ID: {id})")),
    }
}

/// Remove an operation from the queue.
fn remove_operation(
    queue: &OperationQueue,
    id: &str,
    format: OutputFormat,
) -> Result<String, FieldlogError> {
    let removed = queue.remove(id)?;

    match format {
        OutputFormat::Json => to_json(&json!({"id": id, "removed": removed})),
        OutputFormat::Pretty => Ok(if removed {
            format!("Removed operation {id}")
        } else {
            format!("Operation {id} was not queued")
        }),
    }
}

/// Record a failed replay attempt.
fn record_failure(
    queue: &OperationQueue,
    id: &str,
    format: OutputFormat,
) -> Result<String, FieldlogError> {
    if !queue.increment_retry(id)? {
        return match format {
            OutputFormat::Json => to_json(&json!({"id": id, "recorded": false})),
            OutputFormat::Pretty => Ok(format!("Operation {id} is not queued")),
        };
    }

    // The record may be removed between the increment and this read
    let operation = queue.get(id)?;
    let retries = operation.as_ref().map(|op| op.retries);
    let exhausted = operation
        .as_ref()
        .is_some_and(|op| op.is_exhausted(queue.max_retries()));

    match format {
        OutputFormat::Json => to_json(&json!({
            "id": id,
            "recorded": true,
            "retries": retries,
            "exhausted": exhausted,
        })),
        OutputFormat::Pretty => {
            let mut line = format!("Recorded failed attempt for {id}");
            if let Some(retries) = retries {
                line.push_str(&format!(" ({retries}/{} retries)", queue.max_retries()));
            }
            if exhausted {
                line.push_str(&format!("\n{}", "Operation has used up its retries".red()));
            }
            Ok(line)
        }
    }
}

/// Remove operations in bulk.
fn purge_operations(
    queue: &OperationQueue,
    exhausted: bool,
    all: bool,
    force: bool,
    format: OutputFormat,
) -> Result<String, FieldlogError> {
    if all {
        if !force {
            return Err(FieldlogError::Config(
                "Use --force to remove all operations".to_string(),
            ));
        }
        let count = queue.clear()?;

        match format {
            OutputFormat::Json => to_json(&json!({"removed": count})),
            OutputFormat::Pretty => Ok(format!("Removed all {count} operations from queue")),
        }
    } else if exhausted {
        let mut count = 0;
        for operation in queue.exhausted()? {
            if queue.remove(&operation.id)? {
                count += 1;
            }
        }

        match format {
            OutputFormat::Json => to_json(&json!({"removed": count})),
            OutputFormat::Pretty => Ok(format!("Removed {count} exhausted operations")),
        }
    } else {
        Err(FieldlogError::Config(
            "Specify --exhausted or --all".to_string(),
        ))
    }
}
