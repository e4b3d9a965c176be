//! Configuration command implementation.

use serde_json::json;

use crate::cli::args::{ConfigCommands, OutputFormat};
use crate::config::{Config, Paths};
use crate::error::FieldlogError;
use crate::output::to_json;

/// Execute config subcommands.
///
/// # Errors
///
/// Returns an error if the configuration cannot be serialized.
pub fn config(
    config: &Config,
    paths: &Paths,
    cmd: ConfigCommands,
    format: OutputFormat,
) -> Result<String, FieldlogError> {
    match cmd {
        ConfigCommands::Show => match format {
            OutputFormat::Json => to_json(config),
            OutputFormat::Pretty => serde_yaml::to_string(config)
                .map(|yaml| yaml.trim_end().to_string())
                .map_err(|e| FieldlogError::Config(format!("Failed to serialize config: {e}"))),
        },
        ConfigCommands::Path => match format {
            OutputFormat::Json => to_json(&json!({
                "root": paths.root,
                "config": paths.config_file,
                "database": paths.database,
            })),
            OutputFormat::Pretty => Ok(format!(
                "Root:     {}\nConfig:   {}\nDatabase: {}",
                paths.root.display(),
                paths.config_file.display(),
                paths.database.display()
            )),
        },
    }
}
