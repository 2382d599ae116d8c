//! CLI parse: clap types for cam-autogen. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cam-autogen - incremental CAM source generation
#[derive(Parser)]
#[command(name = "cam-autogen")]
#[command(about = "Regenerate CAM registry, CCPP physics caps, and init routines when their inputs change")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (holds autogen.toml)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides workspace config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the registry, physics-suite, and init-routine stages
    Generate,
    /// Inspect or reset the build cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Inspect the resolved configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Show recorded fingerprints
    Show {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Delete the build cache, forcing full regeneration on the next run
    Clear,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the merged configuration as TOML
    Show,
}
