//! Read cache command implementation.

use chrono::Duration;
use serde_json::json;

use crate::cli::args::{CacheCommands, OutputFormat};
use crate::error::FieldlogError;
use crate::features::cache::CacheManager;
use crate::output::{format_cache_entries, format_cache_entry, to_json};

/// Execute cache subcommands.
///
/// `stale_after` controls which entries are flagged stale in the output.
///
/// # Errors
///
/// Returns an error if the store call fails, the snapshot is not valid JSON,
/// or output formatting fails.
pub fn cache(
    cache: &CacheManager,
    cmd: CacheCommands,
    stale_after: Duration,
    format: OutputFormat,
) -> Result<String, FieldlogError> {
    match cmd {
        CacheCommands::Put { key, data } => {
            let data: serde_json::Value = serde_json::from_str(&data)?;
            cache.put(&key, &data)?;

            match format {
                OutputFormat::Json => to_json(&json!({"key": key, "stored": true})),
                OutputFormat::Pretty => Ok(format!("Cached {key}")),
            }
        }
        CacheCommands::Get { key } => match cache.entry(&key)? {
            Some(entry) => format_cache_entry(&entry, stale_after, format),
            None => match format {
                OutputFormat::Json => to_json(&serde_json::Value::Null),
                OutputFormat::Pretty => Ok(format!("Nothing cached for {key}")),
            },
        },
        CacheCommands::List => format_cache_entries(&cache.entries()?, stale_after, format),
        CacheCommands::Remove { key } => {
            let removed = cache.remove(&key)?;

            match format {
                OutputFormat::Json => to_json(&json!({"key": key, "removed": removed})),
                OutputFormat::Pretty => Ok(if removed {
                    format!("Removed {key} from cache")
                } else {
                    format!("Nothing cached for {key}")
                }),
            }
        }
        CacheCommands::Clear => {
            let count = cache.clear()?;

            match format {
                OutputFormat::Json => to_json(&json!({"removed": count})),
                OutputFormat::Pretty => Ok(format!("Cleared {count} cache entries")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use std::sync::Arc;

    fn create_test_cache() -> CacheManager {
        CacheManager::with_database(Arc::new(Database::open_in_memory().unwrap()))
    }

    fn put(manager: &CacheManager, key: &str, data: &str) -> String {
        cache(
            manager,
            CacheCommands::Put {
                key: key.to_string(),
                data: data.to_string(),
            },
            Duration::hours(1),
            OutputFormat::Json,
        )
        .unwrap()
    }

    #[test]
    fn test_put_then_get() {
        let manager = create_test_cache();
        put(&manager, "goals", r#"[{"title": "Read daily"}]"#);

        let out = cache(
            &manager,
            CacheCommands::Get {
                key: "goals".to_string(),
            },
            Duration::hours(1),
            OutputFormat::Json,
        )
        .unwrap();

        assert!(out.contains("Read daily"));
        assert!(out.contains("\"stale\": false"));
    }

    #[test]
    fn test_put_rejects_invalid_json() {
        let manager = create_test_cache();

        let result = cache(
            &manager,
            CacheCommands::Put {
                key: "goals".to_string(),
                data: "[".to_string(),
            },
            Duration::hours(1),
            OutputFormat::Json,
        );

        assert!(matches!(result, Err(FieldlogError::Parse(_))));
        assert!(manager.keys().unwrap().is_empty());
    }

    #[test]
    fn test_get_miss_is_null() {
        let manager = create_test_cache();

        let out = cache(
            &manager,
            CacheCommands::Get {
                key: "absent".to_string(),
            },
            Duration::hours(1),
            OutputFormat::Json,
        )
        .unwrap();
        assert_eq!(out, "null");
    }

    #[test]
    fn test_clear_reports_count() {
        let manager = create_test_cache();
        put(&manager, "a", "1");
        put(&manager, "b", "2");

        let out = cache(
            &manager,
            CacheCommands::Clear,
            Duration::hours(1),
            OutputFormat::Json,
        )
        .unwrap();

        assert!(out.contains("\"removed\": 2"));
        assert!(manager.keys().unwrap().is_empty());
    }

    #[test]
    fn test_remove_reports_miss() {
        let manager = create_test_cache();

        let out = cache(
            &manager,
            CacheCommands::Remove {
                key: "absent".to_string(),
            },
            Duration::hours(1),
            OutputFormat::Json,
        )
        .unwrap();
        assert!(out.contains("\"removed\": false"));
    }
}
