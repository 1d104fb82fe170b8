//! Config command
//!
//! Manage postery configuration.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use postery_core::config::Config;
use std::fs;
use std::path::Path;

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show {
        /// Show as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate the configuration file
    Validate,
}

/// Execute the config command
pub fn execute(cmd: ConfigCommand, path: &Path) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => show_config(path, json),
        ConfigCommand::Init { force } => init_config(path, force),
        ConfigCommand::Validate => validate_config(path),
    }
}

fn show_config(path: &Path, as_json: bool) -> Result<()> {
    let config = super::load_config(path)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("{}", "Configuration:".bold().underline());
    if path.exists() {
        println!("{}", path.display().to_string().dimmed());
    } else {
        println!("{}", "(defaults, no file found)".dimmed());
    }
    println!();
    println!("{}", config.to_toml()?);

    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        eprintln!(
            "{} {} already exists. Use '{}' to overwrite.",
            "⚠".yellow(),
            path.display(),
            "--force".cyan()
        );
        return Ok(());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let content = format!("# postery configuration\n\n{}", Config::default().to_toml()?);
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;

    println!("{} Wrote {}", "✓".green(), path.display());
    Ok(())
}

fn validate_config(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Configuration not found at {}", path.display());
    }

    let config = Config::load(path)?;
    println!("{} Configuration is valid", "✓".green());
    println!(
        "  comments: max_length {}, max_page_size {}",
        config.comments.max_length, config.comments.max_page_size
    );
    println!(
        "  hub: delivery_timeout {:?}",
        config.hub.delivery_timeout()
    );

    Ok(())
}
