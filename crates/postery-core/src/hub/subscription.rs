//! Receiving side of a live comment feed

use crate::comment::Comment;
use crate::types::PostId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TryRecvError};

/// Lifecycle of a subscription. `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Active,
    Cancelled,
}

/// Errors from polling a subscription
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The hub no longer holds the sending half
    #[error("subscription to post {0} is closed")]
    Closed(PostId),
}

/// Handle identifying one registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub(crate) u64);

/// A listener's end of a per-post feed.
///
/// Buffered items stay readable after cancellation; once drained, `recv`
/// returns `None`.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    post_id: PostId,
    receiver: mpsc::Receiver<Comment>,
    cancelled: Arc<AtomicBool>,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriberId,
        post_id: PostId,
        receiver: mpsc::Receiver<Comment>,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Self {
            id,
            post_id,
            receiver,
            cancelled,
        }
    }

    /// Listener ID within the hub
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Post this feed follows
    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    /// Current lifecycle state
    pub fn state(&self) -> SubscriptionState {
        if self.cancelled.load(Ordering::Acquire) {
            SubscriptionState::Cancelled
        } else {
            SubscriptionState::Active
        }
    }

    /// Wait for the next comment, `None` once closed and drained
    pub async fn recv(&mut self) -> Option<Comment> {
        self.receiver.recv().await
    }

    /// Take a buffered comment without waiting
    pub fn try_recv(&mut self) -> Result<Option<Comment>, SubscriptionError> {
        match self.receiver.try_recv() {
            Ok(comment) => Ok(Some(comment)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(SubscriptionError::Closed(self.post_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommentId, UserId};
    use chrono::Utc;

    fn comment(id: u64) -> Comment {
        Comment::new(CommentId(id), PostId(1), None, UserId(1), "hi", Utc::now())
    }

    #[tokio::test]
    async fn test_drains_after_sender_dropped() {
        let (tx, rx) = mpsc::channel(1);
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut sub = Subscription::new(SubscriberId(1), PostId(1), rx, cancelled.clone());

        assert_eq!(sub.try_recv(), Ok(None));
        tx.send(comment(7)).await.unwrap();
        drop(tx);
        cancelled.store(true, Ordering::Release);

        assert_eq!(sub.state(), SubscriptionState::Cancelled);
        assert_eq!(sub.recv().await.map(|c| c.id), Some(CommentId(7)));
        assert_eq!(sub.recv().await, None);
        assert_eq!(sub.try_recv(), Err(SubscriptionError::Closed(PostId(1))));
    }
}
