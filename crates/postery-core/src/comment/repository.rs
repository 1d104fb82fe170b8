//! Comment repository
//!
//! Comments live in an arena keyed by ID. A reply is linked into its
//! parent's child list at write time, under the same lock that inserts it,
//! so readers never rebuild a subtree.

use super::index::CommentIndex;
use super::model::{sort_for_reading, Comment};
use super::validator::CommentValidator;
use crate::config::CommentConfig;
use crate::error::{Result, StoreError};
use crate::hub::CommentPublisher;
use crate::identity::require_identity;
use crate::page::{check_limit, Page};
use crate::post::PostStore;
use crate::types::{CommentId, IdSequence, PostId, UserId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Contract for comment storage backends
pub trait CommentStore: Send + Sync {
    /// Create a root comment or a reply
    fn create_comment(
        &self,
        caller: Option<UserId>,
        post_id: PostId,
        parent_id: Option<CommentId>,
        content: &str,
    ) -> Result<Comment>;

    /// Page through the root comments of a post
    fn get_root_comments(&self, post_id: PostId, limit: usize, offset: usize)
        -> Result<Page<Comment>>;

    /// Page through the direct replies of a comment
    fn get_replies(&self, parent_id: CommentId, limit: usize, offset: usize)
        -> Result<Page<Comment>>;

    /// Load a single comment
    fn get_comment(&self, id: CommentId) -> Result<Comment>;

    /// Remove every comment of a post, returning how many were removed
    fn purge_post(&self, post_id: PostId) -> Result<usize>;
}

#[derive(Debug, Default)]
struct CommentTable {
    comments: HashMap<CommentId, Comment>,
    index: CommentIndex,
    ids: IdSequence,
    last_created_at: Option<DateTime<Utc>>,
}

impl CommentTable {
    /// Creation time for the next insert; never earlier than the last one
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_created_at {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_created_at = Some(stamp);
        stamp
    }

    fn ordered(&self, ids: &[CommentId]) -> Vec<Comment> {
        let mut comments: Vec<Comment> = ids
            .iter()
            .filter_map(|id| self.comments.get(id))
            .cloned()
            .collect();
        sort_for_reading(&mut comments);
        comments
    }
}

/// In-memory comment repository
pub struct CommentRepository {
    inner: RwLock<CommentTable>,
    posts: Arc<dyn PostStore>,
    publisher: Arc<dyn CommentPublisher>,
    validator: CommentValidator,
    max_page_size: usize,
}

impl CommentRepository {
    /// Create a repository with default limits
    pub fn new(posts: Arc<dyn PostStore>, publisher: Arc<dyn CommentPublisher>) -> Self {
        Self::with_config(posts, publisher, &CommentConfig::default())
    }

    /// Create a repository with configured limits
    pub fn with_config(
        posts: Arc<dyn PostStore>,
        publisher: Arc<dyn CommentPublisher>,
        config: &CommentConfig,
    ) -> Self {
        Self {
            inner: RwLock::new(CommentTable::default()),
            posts,
            publisher,
            validator: CommentValidator::with_max_length(config.max_length),
            max_page_size: config.max_page_size,
        }
    }

    /// Rebuild a repository from stored records.
    ///
    /// Records are checked, not repaired: a parent that is missing, belongs
    /// to another post, or disagrees with its child list is an error.
    pub fn from_records(
        posts: Arc<dyn PostStore>,
        publisher: Arc<dyn CommentPublisher>,
        config: &CommentConfig,
        comments: Vec<Comment>,
        next_id: u64,
    ) -> Result<Self> {
        let repo = Self::with_config(posts, publisher, config);
        let comments: HashMap<CommentId, Comment> =
            comments.into_iter().map(|c| (c.id, c)).collect();

        for comment in comments.values() {
            check_linkage(comment, &comments)?;
        }

        {
            let mut table = repo.inner.write().map_err(|_| StoreError::poisoned("comment"))?;
            let floor = comments.keys().map(|id| id.get() + 1).max().unwrap_or(1);
            table.ids = IdSequence::starting_at(next_id.max(floor));
            table.last_created_at = comments.values().map(|c| c.created_at).max();
            table.index.rebuild(comments.values());
            table.comments = comments;
        }

        Ok(repo)
    }

    /// Copy out all records, in reading order, and the next ID to assign
    pub fn records(&self) -> Result<(Vec<Comment>, u64)> {
        let table = self.inner.read().map_err(|_| StoreError::poisoned("comment"))?;
        let mut comments: Vec<Comment> = table.comments.values().cloned().collect();
        sort_for_reading(&mut comments);
        Ok((comments, table.ids.peek()))
    }

    /// Get total comment count
    pub fn count(&self) -> Result<usize> {
        let table = self.inner.read().map_err(|_| StoreError::poisoned("comment"))?;
        Ok(table.comments.len())
    }

    /// Get comment count for one post
    pub fn count_for_post(&self, post_id: PostId) -> Result<usize> {
        let table = self.inner.read().map_err(|_| StoreError::poisoned("comment"))?;
        Ok(table.index.post_comment_count(post_id))
    }

    /// Configured page size ceiling
    pub fn max_page_size(&self) -> usize {
        self.max_page_size
    }

    /// Insert under the write lock; every check that reads shared state
    /// happens here so it cannot race with other writers.
    fn insert(
        &self,
        author: UserId,
        post_id: PostId,
        parent_id: Option<CommentId>,
        content: &str,
    ) -> Result<Comment> {
        let mut table = self.inner.write().map_err(|_| StoreError::poisoned("comment"))?;

        let post = self.posts.get_by_id(post_id)?;
        if !post.comments_enabled() {
            return Err(StoreError::FailedPrecondition(format!(
                "Comments are disabled for post {}",
                post_id
            )));
        }

        if let Some(parent_id) = parent_id {
            let parent = table.comments.get(&parent_id).ok_or_else(|| {
                StoreError::NotFound(format!("Parent comment {} not found", parent_id))
            })?;
            if parent.post_id != post_id {
                return Err(StoreError::InvalidArgument(format!(
                    "Parent comment {} belongs to post {}, not post {}",
                    parent_id, parent.post_id, post_id
                )));
            }
        }

        let id = CommentId(table.ids.next_value());
        let created_at = table.next_timestamp();
        let comment = Comment::new(id, post_id, parent_id, author, content, created_at);

        if let Some(parent) = parent_id.and_then(|p| table.comments.get_mut(&p)) {
            parent.link_child(id);
        }
        table.index.add(&comment);
        table.comments.insert(id, comment.clone());

        Ok(comment)
    }
}

fn check_linkage(comment: &Comment, all: &HashMap<CommentId, Comment>) -> Result<()> {
    if !comment.is_consistent() {
        return Err(StoreError::InvalidArgument(format!(
            "Comment {} has_replies disagrees with its {} children",
            comment.id,
            comment.children.len()
        )));
    }

    if let Some(parent_id) = comment.parent_id {
        let parent = all.get(&parent_id).ok_or_else(|| {
            StoreError::NotFound(format!(
                "Parent comment {} of comment {} not found",
                parent_id, comment.id
            ))
        })?;
        if parent.post_id != comment.post_id {
            return Err(StoreError::InvalidArgument(format!(
                "Comment {} and its parent {} belong to different posts",
                comment.id, parent_id
            )));
        }
        if !parent.children.contains(&comment.id) {
            return Err(StoreError::InvalidArgument(format!(
                "Comment {} is missing from the replies of {}",
                comment.id, parent_id
            )));
        }
    }

    for child_id in &comment.children {
        let linked_back = all
            .get(child_id)
            .map(|child| child.parent_id == Some(comment.id))
            .unwrap_or(false);
        if !linked_back {
            return Err(StoreError::InvalidArgument(format!(
                "Comment {} lists {} as a reply, but it is not",
                comment.id, child_id
            )));
        }
    }

    Ok(())
}

impl CommentStore for CommentRepository {
    fn create_comment(
        &self,
        caller: Option<UserId>,
        post_id: PostId,
        parent_id: Option<CommentId>,
        content: &str,
    ) -> Result<Comment> {
        self.validator.validate_content(content)?;
        let author = require_identity(caller, "create comment")?;

        let comment = self.insert(author, post_id, parent_id, content)?;

        info!(
            comment_id = %comment.id,
            post_id = %post_id,
            parent_id = ?parent_id.map(|p| p.get()),
            "Comment created"
        );

        // Write lock is released; fan-out cannot stall other writers.
        self.publisher.publish_comment(post_id, &comment);
        Ok(comment)
    }

    fn get_root_comments(
        &self,
        post_id: PostId,
        limit: usize,
        offset: usize,
    ) -> Result<Page<Comment>> {
        check_limit(limit, self.max_page_size)?;
        let table = self.inner.read().map_err(|_| StoreError::poisoned("comment"))?;

        let post = self.posts.get_by_id(post_id)?;
        if !post.comments_enabled() {
            debug!(post_id = %post_id, "Comments disabled, returning empty page");
            return Ok(Page::empty(limit, offset));
        }

        let roots = table.ordered(table.index.roots(post_id));
        Ok(Page::window(roots, limit, offset))
    }

    fn get_replies(
        &self,
        parent_id: CommentId,
        limit: usize,
        offset: usize,
    ) -> Result<Page<Comment>> {
        check_limit(limit, self.max_page_size)?;
        let table = self.inner.read().map_err(|_| StoreError::poisoned("comment"))?;

        let parent = table.comments.get(&parent_id).ok_or_else(|| {
            StoreError::NotFound(format!("Parent comment {} not found", parent_id))
        })?;

        let replies = table.ordered(&parent.children);
        Ok(Page::window(replies, limit, offset))
    }

    fn get_comment(&self, id: CommentId) -> Result<Comment> {
        let table = self.inner.read().map_err(|_| StoreError::poisoned("comment"))?;
        table
            .comments
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Comment {} not found", id)))
    }

    fn purge_post(&self, post_id: PostId) -> Result<usize> {
        let mut table = self.inner.write().map_err(|_| StoreError::poisoned("comment"))?;

        let ids = table.index.remove_post(post_id);
        for id in &ids {
            table.comments.remove(id);
        }

        debug!(post_id = %post_id, removed = ids.len(), "Purged comments");
        Ok(ids.len())
    }
}
