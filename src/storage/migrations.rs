//! Schema migrations for the fieldlog store.
//!
//! Each migration upgrades the schema by one version and only ever adds
//! structure. Migrations run automatically when the store is opened.

use rusqlite::Connection;

use crate::error::FieldlogError;

/// Current schema version.
pub const CURRENT_VERSION: i32 = 1;

/// Get the current schema version from the database.
///
/// Returns 0 if no version has been set (new database).
pub fn get_version(conn: &Connection) -> Result<i32, FieldlogError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| FieldlogError::StorageUnavailable(format!("Failed to get schema version: {e}")))
}

fn set_version(conn: &Connection, version: i32) -> Result<(), FieldlogError> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))
        .map_err(|e| FieldlogError::StorageUnavailable(format!("Failed to set schema version: {e}")))
}

/// Run all pending migrations.
pub fn run(conn: &Connection) -> Result<(), FieldlogError> {
    let current = get_version(conn)?;

    if current >= CURRENT_VERSION {
        return Ok(());
    }

    for version in (current + 1)..=CURRENT_VERSION {
        tracing::info!(version, "Applying store migration");
        run_migration(conn, version)?;
        set_version(conn, version)?;
    }

    Ok(())
}

fn run_migration(conn: &Connection, version: i32) -> Result<(), FieldlogError> {
    match version {
        1 => migrate_v1(conn),
        _ => Err(FieldlogError::StorageUnavailable(format!(
            "Unknown migration version: {version}"
        ))),
    }
}

/// Migration v1: the two record sets.
///
/// - `operations`: queued write-intents, keyed by id, insertion order kept in `rowid`
/// - `cache`: last-known-good read snapshots, keyed by caller-chosen key
fn migrate_v1(conn: &Connection) -> Result<(), FieldlogError> {
    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS operations (
            id TEXT PRIMARY KEY NOT NULL,
            type TEXT NOT NULL,
            collection TEXT NOT NULL,
            data TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            retries INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_operations_timestamp
        ON operations(timestamp);

        CREATE INDEX IF NOT EXISTS idx_operations_collection
        ON operations(collection);

        CREATE TABLE IF NOT EXISTS cache (
            key TEXT PRIMARY KEY NOT NULL,
            data TEXT NOT NULL,
            timestamp INTEGER NOT NULL
        );
        ",
    )
    .map_err(|e| FieldlogError::StorageUnavailable(format!("Migration v1 failed: {e}")))
}
