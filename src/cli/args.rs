use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::features::sync::{Collection, OperationKind};

#[derive(Parser)]
#[command(name = "fieldlog")]
#[command(about = "Offline operation queue and read cache for the field service log")]
#[command(long_about = "fieldlog - offline queue and cache inspector

Writes made while the device is offline are kept in a local queue and
replayed against the remote store once connectivity returns. Reads are
cached so the last-known-good data can be shown offline.

QUICK START:
  fieldlog queue status                      Show queue health
  fieldlog queue list --chronological        List operations oldest first
  fieldlog cache list                        Show cached snapshots

OUTPUT FORMATS:
  --output pretty    Human-readable colored output (default)
  --output json      Machine-readable JSON for scripting

For more information on a specific command, run:
  fieldlog <command> --help")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Output format for command results
    ///
    /// Defaults to `general.default_output` from the config file.
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colored output.
    #[default]
    Pretty,
    /// Machine-readable JSON output.
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect and manage the offline operation queue
    Queue(QueueArgs),

    /// Inspect and manage the read cache
    Cache(CacheArgs),

    /// Show the effective configuration
    Config(ConfigArgs),
}

/// Arguments for the operation queue.
#[derive(Args)]
pub struct QueueArgs {
    #[command(subcommand)]
    pub command: QueueCommands,
}

/// Operation queue subcommands.
#[derive(Subcommand)]
pub enum QueueCommands {
    /// Show queue status
    ///
    /// Displays pending and exhausted operation counts per collection.
    Status,

    /// List queued operations
    ///
    /// Operations are shown in the order they were queued.
    List {
        /// Only show operations for this collection
        #[arg(long, short = 'c')]
        collection: Option<Collection>,

        /// Sort by creation time, oldest first
        #[arg(long)]
        chronological: bool,
    },

    /// Show a single queued operation
    Show {
        /// Operation ID
        id: String,
    },

    /// Queue an operation for later replay
    ///
    /// # Examples
    ///
    ///   fieldlog queue add --type create --collection reports --data '{"hours": 5}'
    ///   fieldlog queue add --type delete --collection goals --data '"goal-1"'
    Add {
        /// Operation type (create, update, delete)
        #[arg(long = "type", short = 't')]
        kind: OperationKind,

        /// Target collection (reports, bibleStudies, goals)
        #[arg(long, short = 'c')]
        collection: Collection,

        /// Payload as JSON
        #[arg(long, short = 'd', default_value = "{}")]
        data: String,
    },

    /// Remove an operation from the queue
    ///
    /// Removing an operation that is not queued succeeds.
    Remove {
        /// Operation ID
        id: String,
    },

    /// Record a failed replay attempt for an operation
    Fail {
        /// Operation ID
        id: String,
    },

    /// Remove operations in bulk
    Purge {
        /// Remove operations that have used up their retries
        #[arg(long, conflicts_with = "all")]
        exhausted: bool,

        /// Remove every queued operation
        #[arg(long)]
        all: bool,

        /// Confirm removal of all operations
        #[arg(long)]
        force: bool,
    },
}

/// Arguments for the read cache.
#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommands,
}

/// Read cache subcommands.
#[derive(Subcommand)]
pub enum CacheCommands {
    /// Store a snapshot, replacing any previous one
    Put {
        /// Cache key
        key: String,

        /// Snapshot as JSON
        data: String,
    },

    /// Show the snapshot stored under a key
    Get {
        /// Cache key
        key: String,
    },

    /// List cached snapshots
    List,

    /// Remove a single snapshot
    Remove {
        /// Cache key
        key: String,
    },

    /// Remove every snapshot
    Clear,
}

/// Arguments for configuration.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Configuration subcommands.
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Show where configuration and data are stored
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_output_format_unset() {
        let cli = Cli::try_parse_from(["fieldlog", "queue", "status"]).unwrap();
        assert!(cli.output.is_none());
    }

    #[test]
    fn test_cli_output_format_short() {
        let cli = Cli::try_parse_from(["fieldlog", "-o", "json", "queue", "status"]).unwrap();
        assert_eq!(cli.output, Some(OutputFormat::Json));
    }

    #[test]
    fn test_cli_output_format_global() {
        let cli = Cli::try_parse_from(["fieldlog", "cache", "list", "--output", "json"]).unwrap();
        assert_eq!(cli.output, Some(OutputFormat::Json));
    }

    #[test]
    fn test_cli_queue_add() {
        let cli = Cli::try_parse_from([
            "fieldlog",
            "queue",
            "add",
            "--type",
            "update",
            "--collection",
            "bibleStudies",
            "--data",
            r#"{"id": "s1"}"#,
        ])
        .unwrap();

        let Commands::Queue(args) = cli.command else {
            panic!("Expected Queue command");
        };
        let QueueCommands::Add {
            kind,
            collection,
            data,
        } = args.command
        else {
            panic!("Expected Add subcommand");
        };
        assert_eq!(kind, OperationKind::Update);
        assert_eq!(collection, Collection::BibleStudies);
        assert_eq!(data, r#"{"id": "s1"}"#);
    }

    #[test]
    fn test_cli_queue_add_default_data() {
        let cli = Cli::try_parse_from([
            "fieldlog", "queue", "add", "-t", "create", "-c", "goals",
        ])
        .unwrap();

        if let Commands::Queue(QueueArgs {
            command: QueueCommands::Add { data, .. },
        }) = cli.command
        {
            assert_eq!(data, "{}");
        } else {
            panic!("Expected Add subcommand");
        }
    }

    #[test]
    fn test_cli_queue_add_rejects_unknown_type() {
        let result = Cli::try_parse_from([
            "fieldlog", "queue", "add", "-t", "upsert", "-c", "goals",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_queue_list_filters() {
        let cli = Cli::try_parse_from([
            "fieldlog",
            "queue",
            "list",
            "--collection",
            "reports",
            "--chronological",
        ])
        .unwrap();

        if let Commands::Queue(QueueArgs {
            command:
                QueueCommands::List {
                    collection,
                    chronological,
                },
        }) = cli.command
        {
            assert_eq!(collection, Some(Collection::Reports));
            assert!(chronological);
        } else {
            panic!("Expected List subcommand");
        }
    }

    #[test]
    fn test_cli_queue_purge_conflict() {
        let result = Cli::try_parse_from([
            "fieldlog",
            "queue",
            "purge",
            "--exhausted",
            "--all",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_cache_put() {
        let cli = Cli::try_parse_from(["fieldlog", "cache", "put", "goals", "[]"]).unwrap();

        if let Commands::Cache(CacheArgs {
            command: CacheCommands::Put { key, data },
        }) = cli.command
        {
            assert_eq!(key, "goals");
            assert_eq!(data, "[]");
        } else {
            panic!("Expected Put subcommand");
        }
    }

    #[test]
    fn test_output_format_default() {
        assert!(matches!(OutputFormat::default(), OutputFormat::Pretty));
    }
}
