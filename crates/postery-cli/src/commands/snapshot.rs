//! Snapshot command
//!
//! Manage saved snapshots.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use postery_core::config::Config;
use postery_core::snapshot::{SnapshotId, SnapshotInfo, SnapshotStorage};
use postery_storage::FileSystemSnapshotStorage;

use super::open_storage;

/// Snapshot subcommands
#[derive(Debug, Subcommand)]
pub enum SnapshotCommand {
    /// List saved snapshots, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Limit number of snapshots
        #[arg(long, short, default_value = "10")]
        limit: usize,
    },

    /// Delete a snapshot
    Delete {
        /// Snapshot ID
        id: String,

        /// Skip confirmation
        #[arg(long, short)]
        yes: bool,
    },

    /// Delete all but the newest snapshots
    Clean {
        /// Number of snapshots to keep
        #[arg(long, default_value = "5")]
        keep: usize,

        /// Skip confirmation
        #[arg(long, short)]
        yes: bool,
    },
}

/// Execute the snapshot command
pub fn execute(cmd: SnapshotCommand, config: Config) -> Result<()> {
    let storage = open_storage(&config)?;

    match cmd {
        SnapshotCommand::List { json, limit } => list_snapshots(&storage, json, limit),
        SnapshotCommand::Delete { id, yes } => delete_snapshot(&storage, &id, yes),
        SnapshotCommand::Clean { keep, yes } => clean_snapshots(&storage, keep, yes),
    }
}

/// Snapshots ordered newest first
fn newest_first(storage: &FileSystemSnapshotStorage) -> Result<Vec<SnapshotInfo>> {
    let mut snapshots = storage.list()?;
    snapshots.sort_by(|a, b| b.taken_at.cmp(&a.taken_at));
    Ok(snapshots)
}

fn list_snapshots(storage: &FileSystemSnapshotStorage, as_json: bool, limit: usize) -> Result<()> {
    let snapshots = newest_first(storage)?;

    if snapshots.is_empty() {
        println!("No snapshots found.");
        return Ok(());
    }

    let total = snapshots.len();
    let snapshots: Vec<_> = snapshots.into_iter().take(limit).collect();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
        return Ok(());
    }

    println!("{}", "Snapshots:".bold().underline());
    println!();

    for info in &snapshots {
        let age = chrono::Utc::now()
            .signed_duration_since(info.taken_at)
            .num_hours();
        let age_str = if age < 1 {
            "just now".to_string()
        } else if age < 24 {
            format!("{}h ago", age)
        } else {
            format!("{}d ago", age / 24)
        };

        println!(
            "  {} {} posts, {} comments, {} users ({})",
            info.id.to_string().green(),
            info.post_count.to_string().cyan(),
            info.comment_count.to_string().yellow(),
            info.user_count,
            age_str.dimmed()
        );
    }

    if total > limit {
        println!(
            "\n  {} Showing {} of {} snapshots. Use --limit to show more.",
            "ℹ".blue(),
            limit,
            total
        );
    }

    Ok(())
}

fn delete_snapshot(storage: &FileSystemSnapshotStorage, id: &str, yes: bool) -> Result<()> {
    let snapshot_id = SnapshotId::parse(id)?;
    let snapshot = storage
        .load(&snapshot_id)
        .context(format!("Snapshot '{}' not found", id))?;

    if !yes {
        use dialoguer::Confirm;

        let info = snapshot.info();
        println!("Snapshot: {}", id.green());
        println!(
            "  {} posts, {} comments",
            info.post_count, info.comment_count
        );

        let confirmed = Confirm::new()
            .with_prompt("Delete this snapshot?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    storage.delete(&snapshot_id)?;
    println!("{} Snapshot '{}' deleted.", "✓".green(), id);

    Ok(())
}

fn clean_snapshots(storage: &FileSystemSnapshotStorage, keep: usize, yes: bool) -> Result<()> {
    let stale: Vec<SnapshotInfo> = newest_first(storage)?.into_iter().skip(keep).collect();

    if stale.is_empty() {
        println!("Nothing to clean; {} or fewer snapshots saved.", keep);
        return Ok(());
    }

    println!(
        "Found {} snapshots beyond the newest {}:",
        stale.len().to_string().yellow(),
        keep
    );
    for info in &stale {
        println!(
            "  {} ({})",
            info.id.to_string().dimmed(),
            info.taken_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    if !yes {
        use dialoguer::Confirm;

        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {} snapshots?", stale.len()))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("Cleanup cancelled.");
            return Ok(());
        }
    }

    let mut deleted = 0;
    for info in &stale {
        match storage.delete(&info.id) {
            Ok(()) => deleted += 1,
            Err(e) => tracing::warn!("Failed to delete snapshot {}: {}", info.id, e),
        }
    }

    println!("{} Deleted {} snapshots.", "✓".green(), deleted);

    Ok(())
}
