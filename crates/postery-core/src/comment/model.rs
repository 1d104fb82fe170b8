//! Comment data models

use crate::types::{CommentId, PostId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A comment on a post, possibly a reply to another comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Unique comment identifier
    pub id: CommentId,
    /// Post the comment belongs to
    pub post_id: PostId,
    /// Parent comment, `None` for root comments
    #[serde(default)]
    pub parent_id: Option<CommentId>,
    /// Comment content
    pub content: String,
    /// Author of the comment
    pub author_id: UserId,
    /// When the comment was inserted
    pub created_at: DateTime<Utc>,
    /// True iff at least one comment lists this one as parent
    #[serde(default)]
    pub has_replies: bool,
    /// Direct replies, in creation order
    #[serde(default)]
    pub children: Vec<CommentId>,
}

impl Comment {
    /// Create a comment without replies
    pub fn new(
        id: CommentId,
        post_id: PostId,
        parent_id: Option<CommentId>,
        author_id: UserId,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            post_id,
            parent_id,
            content: content.into(),
            author_id,
            created_at,
            has_replies: false,
            children: Vec::new(),
        }
    }

    /// Check if the comment is attached directly to its post
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Sort key: creation time, then ID
    pub fn order_key(&self) -> (DateTime<Utc>, CommentId) {
        (self.created_at, self.id)
    }

    /// Record a direct reply
    pub fn link_child(&mut self, child: CommentId) {
        self.children.push(child);
        self.has_replies = true;
    }

    /// Check that `has_replies` agrees with the child list
    pub fn is_consistent(&self) -> bool {
        self.has_replies == !self.children.is_empty()
    }
}

/// Sort comments into reading order
pub fn sort_for_reading(comments: &mut [Comment]) {
    comments.sort_by_key(Comment::order_key);
}
