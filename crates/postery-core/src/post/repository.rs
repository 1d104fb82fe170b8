//! Post repository

use super::model::Post;
use crate::error::{Result, StoreError};
use crate::identity::require_identity;
use crate::types::{IdSequence, PostId, UserId};
use std::collections::BTreeMap;
use std::sync::RwLock;
use tracing::{debug, info};

/// Contract for post storage backends.
///
/// The comment repository only ever reads through this trait, which keeps
/// the two repositories independently substitutable.
pub trait PostStore: Send + Sync {
    /// Create a post authored by the caller
    fn create_post(&self, caller: Option<UserId>, title: &str, content: &str) -> Result<Post>;

    /// Load a post by ID
    fn get_by_id(&self, id: PostId) -> Result<Post>;

    /// List all posts
    fn list_all(&self) -> Result<Vec<Post>>;

    /// Turn comments on or off; author only
    fn set_comments_enabled(&self, caller: Option<UserId>, id: PostId, enabled: bool)
        -> Result<()>;

    /// Delete a post; author only
    fn delete(&self, caller: Option<UserId>, id: PostId) -> Result<()>;

    /// Check if a post exists
    fn exists(&self, id: PostId) -> bool {
        self.get_by_id(id).is_ok()
    }
}

#[derive(Debug, Default)]
struct PostTable {
    posts: BTreeMap<PostId, Post>,
    ids: IdSequence,
}

/// In-memory post repository
#[derive(Debug, Default)]
pub struct PostRepository {
    inner: RwLock<PostTable>,
}

impl PostRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a repository from stored records
    pub fn from_records(posts: Vec<Post>, next_id: u64) -> Self {
        let floor = posts.iter().map(|p| p.id.get() + 1).max().unwrap_or(1);
        let posts = posts.into_iter().map(|p| (p.id, p)).collect();
        Self {
            inner: RwLock::new(PostTable {
                posts,
                ids: IdSequence::starting_at(next_id.max(floor)),
            }),
        }
    }

    /// Copy out all records and the next ID to assign
    pub fn records(&self) -> Result<(Vec<Post>, u64)> {
        let table = self.inner.read().map_err(|_| StoreError::poisoned("post"))?;
        Ok((table.posts.values().cloned().collect(), table.ids.peek()))
    }

    /// Get total post count
    pub fn count(&self) -> Result<usize> {
        let table = self.inner.read().map_err(|_| StoreError::poisoned("post"))?;
        Ok(table.posts.len())
    }

    /// Run `f` against a post the caller owns
    fn with_owned_post<T>(
        &self,
        caller: Option<UserId>,
        id: PostId,
        action: &str,
        f: impl FnOnce(&mut PostTable) -> T,
    ) -> Result<T> {
        let user = require_identity(caller, action)?;
        let mut table = self.inner.write().map_err(|_| StoreError::poisoned("post"))?;

        let post = table
            .posts
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("Post {} not found", id)))?;

        if !post.is_authored_by(user) {
            return Err(StoreError::Forbidden(format!(
                "Only the author of post {} may {}",
                id, action
            )));
        }

        Ok(f(&mut table))
    }
}

impl PostStore for PostRepository {
    fn create_post(&self, caller: Option<UserId>, title: &str, content: &str) -> Result<Post> {
        let author = require_identity(caller, "create post")?;
        let mut table = self.inner.write().map_err(|_| StoreError::poisoned("post"))?;

        let id = PostId(table.ids.next_value());
        let post = Post::new(id, author, title, content);
        table.posts.insert(id, post.clone());

        info!(post_id = %id, author_id = %author, "Post created");
        Ok(post)
    }

    fn get_by_id(&self, id: PostId) -> Result<Post> {
        let table = self.inner.read().map_err(|_| StoreError::poisoned("post"))?;
        table
            .posts
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Post {} not found", id)))
    }

    fn list_all(&self) -> Result<Vec<Post>> {
        let table = self.inner.read().map_err(|_| StoreError::poisoned("post"))?;
        Ok(table.posts.values().cloned().collect())
    }

    fn set_comments_enabled(
        &self,
        caller: Option<UserId>,
        id: PostId,
        enabled: bool,
    ) -> Result<()> {
        let action = if enabled { "enable comments" } else { "disable comments" };
        self.with_owned_post(caller, id, action, |table| {
            if let Some(post) = table.posts.get_mut(&id) {
                post.comments_disabled = !enabled;
            }
        })?;

        debug!(post_id = %id, enabled, "Comment setting changed");
        Ok(())
    }

    fn delete(&self, caller: Option<UserId>, id: PostId) -> Result<()> {
        self.with_owned_post(caller, id, "delete the post", |table| {
            table.posts.remove(&id);
        })?;

        info!(post_id = %id, "Post deleted");
        Ok(())
    }

    fn exists(&self, id: PostId) -> bool {
        self.inner
            .read()
            .map(|t| t.posts.contains_key(&id))
            .unwrap_or(false)
    }
}
