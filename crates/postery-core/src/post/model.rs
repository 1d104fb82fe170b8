//! Post data models

use crate::types::{PostId, UserId};
use serde::{Deserialize, Serialize};

/// A post that readers can comment on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Unique post identifier
    pub id: PostId,
    /// Post title
    pub title: String,
    /// Post body
    pub content: String,
    /// Author of the post
    pub author_id: UserId,
    /// Whether new comments are refused
    #[serde(default)]
    pub comments_disabled: bool,
}

impl Post {
    /// Create a post with comments enabled
    pub fn new(
        id: PostId,
        author_id: UserId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            content: content.into(),
            author_id,
            comments_disabled: false,
        }
    }

    /// Check if new comments are accepted
    pub fn comments_enabled(&self) -> bool {
        !self.comments_disabled
    }

    /// Check if the given user wrote this post
    pub fn is_authored_by(&self, user: UserId) -> bool {
        self.author_id == user
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post_accepts_comments() {
        let post = Post::new(PostId(1), UserId(7), "Title", "Body");
        assert!(post.comments_enabled());
        assert!(post.is_authored_by(UserId(7)));
        assert!(!post.is_authored_by(UserId(8)));
    }

    #[test]
    fn test_post_wire_format() {
        let mut post = Post::new(PostId(3), UserId(1), "T", "C");
        post.comments_disabled = true;

        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["authorId"], 1);
        assert_eq!(json["commentsDisabled"], true);

        let back: Post = serde_json::from_value(json).unwrap();
        assert_eq!(back, post);
    }
}
