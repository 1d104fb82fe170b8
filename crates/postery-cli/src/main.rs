//! postery - content store playground
//!
//! Drives the postery store from the terminal: run a scripted discussion
//! with live notifications, then inspect saved snapshots.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run the scripted session and keep a snapshot
//! postery demo --save
//!
//! # Print the threads of the latest snapshot
//! postery inspect
//!
//! # Write a default configuration file
//! postery config init
//! ```

mod commands;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = commands::run().await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
