//! Prebake - Prebuilt Artifact Cache Resolver
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use prebake::cli::{Cli, Commands};
use prebake::config::ConfigManager;
use prebake::error::PrebakeResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> PrebakeResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("prebake=warn"),
        1 => EnvFilter::new("prebake=info"),
        _ => EnvFilter::new("prebake=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let config = config_manager.load().await?;

    // Dispatch to command
    match cli.command {
        Commands::Resolve(args) => prebake::cli::commands::resolve(args, &config).await,
        Commands::Status => prebake::cli::commands::status(&config).await,
        Commands::Cache(args) => prebake::cli::commands::cache(args, &config).await,
        Commands::Config(args) => {
            prebake::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
