//! Comment indexing for fast lookup

use super::model::Comment;
use crate::types::{CommentId, PostId};
use std::collections::HashMap;

/// Post-level indexes over the comment arena.
///
/// Reply lists live on the parent record itself; this index only covers
/// what cannot be reached from a parent.
#[derive(Debug, Clone, Default)]
pub struct CommentIndex {
    /// Root comments per post, in insertion order
    roots: HashMap<PostId, Vec<CommentId>>,
    /// Every comment per post, in insertion order
    by_post: HashMap<PostId, Vec<CommentId>>,
}

impl CommentIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a comment to the index
    pub fn add(&mut self, comment: &Comment) {
        if comment.is_root() {
            self.roots
                .entry(comment.post_id)
                .or_default()
                .push(comment.id);
        }

        self.by_post
            .entry(comment.post_id)
            .or_default()
            .push(comment.id);
    }

    /// Drop everything indexed under a post, returning the comment IDs
    pub fn remove_post(&mut self, post_id: PostId) -> Vec<CommentId> {
        self.roots.remove(&post_id);
        self.by_post.remove(&post_id).unwrap_or_default()
    }

    /// Root comment IDs of a post
    pub fn roots(&self, post_id: PostId) -> &[CommentId] {
        self.roots.get(&post_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Get comment count for a post
    pub fn post_comment_count(&self, post_id: PostId) -> usize {
        self.by_post.get(&post_id).map(|ids| ids.len()).unwrap_or(0)
    }

    /// Clear the entire index
    pub fn clear(&mut self) {
        self.roots.clear();
        self.by_post.clear();
    }

    /// Rebuild index from a collection of comments, in reading order
    pub fn rebuild<'a>(&mut self, comments: impl IntoIterator<Item = &'a Comment>) {
        self.clear();
        let mut ordered: Vec<&Comment> = comments.into_iter().collect();
        ordered.sort_by_key(|c| c.order_key());
        for comment in ordered {
            self.add(comment);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserId;
    use chrono::Utc;

    fn create_test_comment(id: u64, post: u64, parent: Option<u64>) -> Comment {
        Comment::new(
            CommentId(id),
            PostId(post),
            parent.map(CommentId),
            UserId(1),
            "Test",
            Utc::now(),
        )
    }

    #[test]
    fn test_roots_only_hold_root_comments() {
        let mut index = CommentIndex::new();
        index.add(&create_test_comment(1, 1, None));
        index.add(&create_test_comment(2, 1, Some(1)));
        index.add(&create_test_comment(3, 1, None));

        assert_eq!(index.roots(PostId(1)), &[CommentId(1), CommentId(3)]);
        assert_eq!(index.post_comment_count(PostId(1)), 3);
    }

    #[test]
    fn test_posts_are_separate() {
        let mut index = CommentIndex::new();
        index.add(&create_test_comment(1, 1, None));
        index.add(&create_test_comment(2, 2, None));

        assert_eq!(index.roots(PostId(1)), &[CommentId(1)]);
        assert_eq!(index.roots(PostId(2)), &[CommentId(2)]);
        assert!(index.roots(PostId(3)).is_empty());
        assert_eq!(index.post_comment_count(PostId(1)), 1);
        assert_eq!(index.post_comment_count(PostId(2)), 1);
    }

    #[test]
    fn test_remove_post() {
        let mut index = CommentIndex::new();
        index.add(&create_test_comment(1, 1, None));
        index.add(&create_test_comment(2, 1, Some(1)));
        index.add(&create_test_comment(3, 2, None));

        let removed = index.remove_post(PostId(1));
        assert_eq!(removed, vec![CommentId(1), CommentId(2)]);
        assert!(index.roots(PostId(1)).is_empty());
        assert_eq!(index.post_comment_count(PostId(2)), 1);

        assert!(index.remove_post(PostId(1)).is_empty());
    }

    #[test]
    fn test_rebuild_orders_by_creation() {
        let first = create_test_comment(1, 1, None);
        let second = create_test_comment(2, 1, None);

        let mut index = CommentIndex::new();
        index.rebuild([&second, &first]);
        assert_eq!(index.roots(PostId(1)), &[CommentId(1), CommentId(2)]);

        index.clear();
        assert!(index.roots(PostId(1)).is_empty());
        assert_eq!(index.post_comment_count(PostId(1)), 0);
    }
}
