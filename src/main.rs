use std::error::Error as _;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fieldlog::cli::args::{Cli, Commands};
use fieldlog::cli::commands;
use fieldlog::config::{Config, Paths};
use fieldlog::error::FieldlogError;
use fieldlog::features::cache::CacheManager;
use fieldlog::features::sync::OperationQueue;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        let mut cause = e.source();
        while let Some(inner) = cause {
            eprintln!("  {}: {}", "caused by".dimmed(), inner);
            cause = inner.source();
        }
        std::process::exit(1);
    }
}

fn run() -> Result<(), FieldlogError> {
    let cli = Cli::parse();
    let config = Config::load()?;
    init_tracing(&config.general.log_level);

    let format = cli.output.unwrap_or(config.general.default_output);

    let output = match cli.command {
        Commands::Queue(args) => {
            let queue = OperationQueue::new()?.with_max_retries(config.queue.max_retries);
            commands::queue(&queue, args.command, format)?
        }
        Commands::Cache(args) => {
            let cache = CacheManager::new()?;
            commands::cache(&cache, args.command, config.cache.stale_after(), format)?
        }
        Commands::Config(args) => commands::config(&config, &Paths::new()?, args.command, format)?,
    };

    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

/// Log to stderr so stdout stays parseable. `RUST_LOG` overrides the
/// configured level.
fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
