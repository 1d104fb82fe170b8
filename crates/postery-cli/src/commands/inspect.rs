//! Inspect command
//!
//! Restores a snapshot into a fresh store and prints its threads.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use postery_core::config::Config;
use postery_core::post::PostStore;
use postery_core::snapshot::{SnapshotId, SnapshotStorage, StoreSnapshot};
use postery_core::types::PostId;
use postery_core::ContentStore;

use super::{open_storage, thread};

/// Inspect command arguments
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Snapshot ID (defaults to the latest snapshot)
    pub id: Option<String>,

    /// Only show this post
    #[arg(long)]
    pub post: Option<String>,

    /// Output the restored posts and comments as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the inspect command
pub fn execute(args: InspectArgs, config: Config) -> Result<()> {
    let storage = open_storage(&config)?;

    let snapshot = match &args.id {
        Some(id) => {
            let id = SnapshotId::parse(id)?;
            storage
                .load(&id)
                .with_context(|| format!("Snapshot '{}' could not be loaded", id))?
        }
        None => storage
            .latest()?
            .ok_or_else(|| anyhow!("No snapshots found. Run 'postery demo --save' first."))?,
    };

    let only_post = args
        .post
        .as_deref()
        .map(str::parse::<PostId>)
        .transpose()?;

    if args.json {
        return print_json(&snapshot, only_post);
    }

    let info = snapshot.info();
    let page_size = config.comments.max_page_size.min(20);
    let store = ContentStore::from_snapshot(config, snapshot)?;

    println!("{}", "Snapshot".bold().underline());
    println!("  ID: {}", info.id.to_string().green());
    println!("  Taken: {}", info.taken_at.format("%Y-%m-%d %H:%M:%S"));
    println!(
        "  {} posts, {} comments, {} users",
        info.post_count.to_string().cyan(),
        info.comment_count.to_string().yellow(),
        info.user_count
    );

    let posts = match only_post {
        Some(id) => vec![store.posts().get_by_id(id)?],
        None => store.posts().list_all()?,
    };

    for post in posts {
        println!();
        let lock = if post.comments_enabled() {
            String::new()
        } else {
            format!(" {}", "[comments disabled]".yellow())
        };
        println!(
            "{} {} by user {}{}",
            format!("Post {}", post.id).bold(),
            post.title,
            post.author_id,
            lock
        );
        // Root listings are empty while comments are disabled
        if post.comments_enabled() {
            thread::print_thread(&**store.comments(), post.id, page_size)?;
        } else {
            println!("  {}", "(thread hidden while comments are disabled)".dimmed());
        }
    }

    Ok(())
}

fn print_json(snapshot: &StoreSnapshot, only_post: Option<PostId>) -> Result<()> {
    let keep = |id: PostId| only_post.map(|p| p == id).unwrap_or(true);

    let posts: Vec<_> = snapshot.posts.iter().filter(|p| keep(p.id)).collect();
    let comments: Vec<_> = snapshot
        .comments
        .iter()
        .filter(|c| keep(c.post_id))
        .collect();
    let users: Vec<_> = snapshot.users.iter().map(|r| &r.user).collect();

    let view = serde_json::json!({
        "id": snapshot.id,
        "takenAt": snapshot.taken_at,
        "posts": posts,
        "comments": comments,
        "users": users,
    });
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
