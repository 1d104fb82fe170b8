//! Posts
//!
//! A post owns the comment-enablement flag that the comment repository
//! checks before accepting a new comment.

pub mod model;
pub mod repository;

pub use model::Post;
pub use repository::{PostRepository, PostStore};
