//! Demo command
//!
//! Runs a scripted discussion against an in-memory store: two users sign
//! in, one writes a post, a live subscriber follows it while comments and
//! replies arrive, and the final thread is printed.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use postery_core::comment::{Comment, CommentStore};
use postery_core::config::Config;
use postery_core::hub::Subscription;
use postery_core::post::PostStore;
use postery_core::snapshot::SnapshotStorage;
use postery_core::user::UserStore;
use postery_core::{ContentStore, UserId};
use std::time::Duration;

use super::{open_storage, thread};

/// How long the demo waits for each live notification
const NOTIFICATION_WAIT: Duration = Duration::from_secs(1);

/// Demo command arguments
#[derive(Debug, Args)]
pub struct DemoArgs {
    /// Save a snapshot of the final state
    #[arg(long)]
    pub save: bool,

    /// Number of replies posted under the first comment
    #[arg(long, default_value_t = 3)]
    pub replies: usize,

    /// Print live notifications as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the demo command
pub async fn execute(args: DemoArgs, config: Config) -> Result<()> {
    let store = ContentStore::new(config.clone()).context("Failed to build the store")?;
    let page_size = config.comments.max_page_size.min(20);

    println!("{}", "Signing in".bold().underline());
    let alice = sign_in(&store, "alice", "wonderland")?;
    let bob = sign_in(&store, "bob", "builder")?;

    let post = store
        .posts()
        .create_post(alice, "Welcome to postery", "Say hello below.")?;
    println!();
    println!(
        "{} Post {} \"{}\"",
        "✓".green(),
        post.id.to_string().cyan(),
        post.title
    );

    let (mut feed, unsubscribe) = store.hub().subscribe(post.id).await;
    println!("{} Subscribed to post {}", "✓".green(), post.id);

    println!();
    println!("{}", "Live notifications".bold().underline());
    let root = store
        .comments()
        .create_comment(bob, post.id, None, "Hello from bob!")?;
    announce(&mut feed, args.json).await?;

    for i in 0..args.replies {
        let (author, text) = if i % 2 == 0 {
            (alice, format!("Welcome, bob! ({})", i + 1))
        } else {
            (bob, format!("Thanks, alice! ({})", i + 1))
        };
        store
            .comments()
            .create_comment(author, post.id, Some(root.id), &text)?;
        announce(&mut feed, args.json).await?;
    }

    // Locked posts refuse new comments
    store.posts().set_comments_enabled(alice, post.id, false)?;
    match store
        .comments()
        .create_comment(bob, post.id, None, "Anyone still here?")
    {
        Ok(_) => println!("{} Comment accepted on a locked post", "✗".red()),
        Err(e) => println!("  {} {}", "refused:".yellow(), e),
    }
    store.posts().set_comments_enabled(alice, post.id, true)?;

    unsubscribe.cancel().await;
    println!("{} Unsubscribed ({:?})", "✓".green(), feed.state());

    println!();
    println!("{}", "Thread".bold().underline());
    println!("  {}", post.title.bold());
    let shown = thread::print_thread(&**store.comments(), post.id, page_size)?;

    let stats = store.hub().stats().await;
    println!();
    println!(
        "  {} comments, {} delivered, {} dropped",
        shown.to_string().cyan(),
        stats.delivered.to_string().green(),
        stats.dropped.to_string().yellow()
    );

    if args.save {
        let storage = open_storage(&config)?;
        let snapshot = store.snapshot()?;
        storage.save(&snapshot).context("Failed to save snapshot")?;
        println!(
            "{} Saved snapshot {} in {}",
            "✓".green(),
            snapshot.id.to_string().cyan(),
            storage.snapshots_dir().display()
        );
    }

    Ok(())
}

fn sign_in(store: &ContentStore, name: &str, password: &str) -> Result<Option<UserId>> {
    let email = format!("{}@example.com", name);
    let user = store.users().register(name, &email, password)?;
    let token = store.users().login(name, password)?;
    let identity = store.resolve_identity(token.as_str());

    println!(
        "  {} {} (user {})",
        "✓".green(),
        user.username,
        user.id.to_string().cyan()
    );
    Ok(identity)
}

/// Wait for the next live notification and print it
async fn announce(feed: &mut Subscription, as_json: bool) -> Result<()> {
    match tokio::time::timeout(NOTIFICATION_WAIT, feed.recv()).await {
        Ok(Some(comment)) => print_notification(&comment, as_json),
        Ok(None) => {
            println!("  {} feed closed", "⚠".yellow());
            Ok(())
        }
        Err(_) => {
            println!("  {} no notification within {:?}", "⚠".yellow(), NOTIFICATION_WAIT);
            Ok(())
        }
    }
}

fn print_notification(comment: &Comment, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string(comment)?);
        return Ok(());
    }

    let kind = match comment.parent_id {
        Some(parent) => format!("reply to #{}", parent),
        None => "comment".to_string(),
    };
    println!(
        "  {} {} {} from user {}: {}",
        "→".blue(),
        format!("#{}", comment.id).cyan(),
        kind.dimmed(),
        comment.author_id,
        comment.content
    );
    Ok(())
}
