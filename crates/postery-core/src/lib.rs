//! postery-core - Core library for postery
//!
//! This crate provides the content store behind a discussion service:
//! posts, threaded comments with offset pagination, user accounts, and
//! live per-post comment notifications.

pub mod comment;
pub mod config;
pub mod error;
pub mod hub;
pub mod identity;
pub mod page;
pub mod post;
pub mod snapshot;
pub mod store;
pub mod types;
pub mod user;

pub use error::{ErrorKind, Result, StoreError};
pub use store::{ContentStore, StorePosts};
pub use types::*;
