//! CLI commands module
//!
//! This module contains all CLI command implementations.

pub mod config;
pub mod demo;
pub mod inspect;
pub mod snapshot;
pub mod thread;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use postery_core::config::Config;
use postery_storage::FileSystemSnapshotStorage;
use std::path::{Path, PathBuf};

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = ".postery/config.toml";

/// postery - posts, threaded comments and live notifications
#[derive(Debug, Parser)]
#[command(name = "postery")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "POSTERY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a scripted discussion with a live subscriber
    Demo(demo::DemoArgs),

    /// Print the posts and comment threads of a snapshot
    Inspect(inspect::InspectArgs),

    /// Manage saved snapshots
    #[command(subcommand)]
    Snapshot(snapshot::SnapshotCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(config::ConfigCommand),
}

/// Run the CLI application
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    setup_logging(cli.verbose);

    // Handle color output
    if cli.no_color {
        colored::control::set_override(false);
    }

    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    // Dispatch to command handler
    match cli.command {
        Commands::Demo(args) => demo::execute(args, load_config(&config_path)?).await,
        Commands::Inspect(args) => inspect::execute(args, load_config(&config_path)?),
        Commands::Snapshot(cmd) => snapshot::execute(cmd, load_config(&config_path)?),
        Commands::Config(cmd) => config::execute(cmd, &config_path),
    }
}

/// Load the configuration file, falling back to defaults when it is absent
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!("No configuration at {:?}, using defaults", path);
        return Ok(Config::default());
    }

    Config::load(path).with_context(|| format!("Failed to load {}", path.display()))
}

/// Open snapshot storage as configured
pub fn open_storage(config: &Config) -> Result<FileSystemSnapshotStorage> {
    FileSystemSnapshotStorage::from_config(&config.storage)
        .context("Failed to open snapshot storage")
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_help_text() {
        let cmd = Cli::command();
        assert!(cmd.get_about().is_some());
    }

    #[test]
    fn test_parse_demo_flags() {
        let cli = Cli::try_parse_from(["postery", "-vv", "demo", "--save", "--replies", "5"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Demo(args) => {
                assert!(args.save);
                assert_eq!(args.replies, 5);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = load_config(&temp.path().join("absent.toml")).unwrap();
        assert_eq!(config.comments.max_length, 2000);
    }

    #[test]
    fn test_broken_config_is_reported() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[comments]\nmax_page_size = 0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("max_page_size"));
    }
}
