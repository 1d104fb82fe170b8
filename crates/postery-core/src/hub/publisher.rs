//! Hand-off point between the comment writer and live notifications

use crate::comment::Comment;
use crate::types::PostId;

/// Receives every comment after its write is committed.
///
/// Called with no repository lock held. Implementations must return
/// promptly; delivery to subscribers happens elsewhere.
pub trait CommentPublisher: Send + Sync {
    /// Announce a freshly created comment on `post_id`
    fn publish_comment(&self, post_id: PostId, comment: &Comment);
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;
    use std::sync::Mutex;

    /// Publisher that keeps every announcement
    #[derive(Debug, Default)]
    pub struct RecordingPublisher {
        published: Mutex<Vec<(PostId, Comment)>>,
    }

    impl RecordingPublisher {
        pub fn new() -> Self {
            Self::default()
        }

        /// Everything published so far, oldest first
        pub fn published(&self) -> Vec<(PostId, Comment)> {
            self.published.lock().unwrap().clone()
        }
    }

    impl CommentPublisher for RecordingPublisher {
        fn publish_comment(&self, post_id: PostId, comment: &Comment) {
            self.published
                .lock()
                .unwrap()
                .push((post_id, comment.clone()));
        }
    }

    #[test]
    fn test_records_in_order() {
        use crate::types::{CommentId, UserId};
        use chrono::Utc;

        let first = Comment::new(CommentId(1), PostId(2), None, UserId(3), "hi", Utc::now());
        let second = Comment::new(CommentId(2), PostId(2), None, UserId(3), "yo", Utc::now());

        let recorder = RecordingPublisher::new();
        recorder.publish_comment(PostId(2), &first);
        recorder.publish_comment(PostId(2), &second);

        assert_eq!(
            recorder.published(),
            vec![(PostId(2), first), (PostId(2), second)]
        );
    }
}
