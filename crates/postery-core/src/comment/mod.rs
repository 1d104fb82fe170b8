//! Comment system module
//!
//! Handles threaded comments: storage, indexing, and validation.

pub mod index;
pub mod model;
pub mod repository;
pub mod validator;

pub use index::CommentIndex;
pub use model::{sort_for_reading, Comment};
pub use repository::{CommentRepository, CommentStore};
pub use validator::CommentValidator;
