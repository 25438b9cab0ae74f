//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Prebake - Prebuilt Artifact Cache Resolver
///
/// Satisfies component dependencies from a local or remote artifact cache,
/// falling back to a normal from-source build on any miss or failure.
#[derive(Parser, Debug)]
#[command(name = "prebake")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "PREBAKE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve components from the artifact cache
    Resolve(ResolveArgs),

    /// Check system health and dependencies
    Status,

    /// Manage the local artifact cache
    Cache(CacheArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the resolve command
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Component names to resolve
    #[arg(required = true)]
    pub components: Vec<String>,

    /// Exact version constraint (dotted decimal, applies to all named components)
    #[arg(long)]
    pub version: Option<String>,

    /// Root directory containing component source trees
    #[arg(long)]
    pub source_root: Option<PathBuf>,

    /// Install destination prefix
    #[arg(long)]
    pub install_dir: Option<PathBuf>,

    /// Force a from-source build for the named components
    #[arg(long, conflicts_with = "require_prebuilt")]
    pub force_source: bool,

    /// Fail hard if no prebuilt artifact is found
    #[arg(long)]
    pub require_prebuilt: bool,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cached artifact archives
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Remove all cached artifact archives
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for list commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}
