//! Notification hub: per-post fan-out of new comments

use super::publisher::CommentPublisher;
use super::subscription::{SubscriberId, Subscription};
use crate::comment::Comment;
use crate::config::HubConfig;
use crate::types::PostId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, Weak};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::SendError, error::SendTimeoutError, error::TrySendError};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Slots in each listener's buffer
pub const SUBSCRIBER_BUFFER: usize = 1;

type DispatchQueue = mpsc::UnboundedSender<(PostId, Comment)>;

#[derive(Debug)]
struct Subscriber {
    id: SubscriberId,
    sender: mpsc::Sender<Comment>,
}

#[derive(Debug, Default)]
struct Registry {
    by_post: HashMap<PostId, Vec<Subscriber>>,
}

impl Registry {
    fn remove(&mut self, post_id: PostId, id: SubscriberId) -> bool {
        let Some(subscribers) = self.by_post.get_mut(&post_id) else {
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        let removed = subscribers.len() != before;
        if subscribers.is_empty() {
            self.by_post.remove(&post_id);
        }
        removed
    }
}

#[derive(Debug)]
struct HubInner {
    registry: Mutex<Registry>,
    dispatch: StdMutex<Option<DispatchQueue>>,
    config: HubConfig,
    next_id: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

/// Delivery counters since the hub was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    /// Comments accepted by a subscriber channel
    pub delivered: u64,
    /// Comments skipped after the delivery timeout
    pub dropped: u64,
    /// Listeners currently registered
    pub subscribers: usize,
}

/// Publish/subscribe hub for new comments.
///
/// Each listener gets its own bounded channel. Delivery and removal run
/// under one lock, so a send never targets a channel that was already
/// unregistered. Cloning shares the same registry.
#[derive(Debug, Clone)]
pub struct NotificationHub {
    inner: Arc<HubInner>,
}

impl NotificationHub {
    /// Create a hub with default settings
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    /// Create a hub with custom settings
    pub fn with_config(config: HubConfig) -> Self {
        Self {
            inner: Arc::new(HubInner {
                registry: Mutex::new(Registry::default()),
                dispatch: StdMutex::new(None),
                config,
                next_id: AtomicU64::new(1),
                delivered: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Register a listener for `post_id`
    pub async fn subscribe(&self, post_id: PostId) -> (Subscription, Unsubscribe) {
        let id = SubscriberId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_BUFFER);
        let cancelled = Arc::new(AtomicBool::new(false));

        {
            let mut registry = self.inner.registry.lock().await;
            registry
                .by_post
                .entry(post_id)
                .or_default()
                .push(Subscriber { id, sender });
        }

        debug!(post_id = %post_id, subscriber = id.0, "Subscribed");

        let subscription = Subscription::new(id, post_id, receiver, cancelled.clone());
        let unsubscribe = Unsubscribe {
            hub: self.clone(),
            post_id,
            id,
            cancelled,
        };
        (subscription, unsubscribe)
    }

    /// Deliver `comment` to every listener of `post_id`.
    ///
    /// Each listener gets one non-blocking attempt, then a bounded wait if
    /// its buffer is full. Items that still do not fit are dropped. Returns
    /// how many listeners accepted the comment.
    pub async fn publish(&self, post_id: PostId, comment: &Comment) -> usize {
        let timeout = self.inner.config.delivery_timeout();
        let mut registry = self.inner.registry.lock().await;

        let Some(subscribers) = registry.by_post.get_mut(&post_id) else {
            return 0;
        };

        // Listeners that dropped their receiver count as cancelled
        subscribers.retain(|s| !s.sender.is_closed());

        let mut delivered = 0;
        for subscriber in subscribers.iter() {
            let accepted = match subscriber.sender.try_send(comment.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(item)) => {
                    match subscriber.sender.send_timeout(item, timeout).await {
                        Ok(()) => true,
                        Err(SendTimeoutError::Timeout(_)) => {
                            warn!(
                                post_id = %post_id,
                                comment_id = %comment.id,
                                subscriber = subscriber.id.0,
                                "Subscriber too slow, notification dropped"
                            );
                            self.inner.dropped.fetch_add(1, Ordering::Relaxed);
                            false
                        }
                        Err(SendTimeoutError::Closed(_)) => false,
                    }
                }
                Err(TrySendError::Closed(_)) => false,
            };
            if accepted {
                delivered += 1;
            }
        }

        subscribers.retain(|s| !s.sender.is_closed());
        if subscribers.is_empty() {
            registry.by_post.remove(&post_id);
        }

        self.inner
            .delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);
        debug!(post_id = %post_id, comment_id = %comment.id, delivered, "Published comment");
        delivered
    }

    /// Number of listeners registered for `post_id`
    pub async fn subscriber_count(&self, post_id: PostId) -> usize {
        let registry = self.inner.registry.lock().await;
        registry.by_post.get(&post_id).map(Vec::len).unwrap_or(0)
    }

    /// Delivery counters and current listener count
    pub async fn stats(&self) -> HubStats {
        let registry = self.inner.registry.lock().await;
        HubStats {
            delivered: self.inner.delivered.load(Ordering::Relaxed),
            dropped: self.inner.dropped.load(Ordering::Relaxed),
            subscribers: registry.by_post.values().map(Vec::len).sum(),
        }
    }

    async fn unsubscribe(&self, post_id: PostId, id: SubscriberId) -> bool {
        let mut registry = self.inner.registry.lock().await;
        registry.remove(post_id, id)
    }

    /// Start a dispatcher on `handle` and return its queue
    fn start_dispatcher(&self, handle: &Handle) -> DispatchQueue {
        let (queue, pending) = mpsc::unbounded_channel();
        handle.spawn(dispatch(Arc::downgrade(&self.inner), pending));
        debug!("Notification dispatcher started");
        queue
    }
}

/// Deliver queued comments one at a time, in queue order.
///
/// Ends once every hub handle is gone, since the queue's sender lives in
/// the hub.
async fn dispatch(
    hub: Weak<HubInner>,
    mut pending: mpsc::UnboundedReceiver<(PostId, Comment)>,
) {
    while let Some((post_id, comment)) = pending.recv().await {
        let Some(inner) = hub.upgrade() else {
            break;
        };
        NotificationHub { inner }.publish(post_id, &comment).await;
    }
    debug!("Notification dispatcher stopped");
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentPublisher for NotificationHub {
    /// Queues the comment for the hub's dispatcher task, which delivers in
    /// publish order. The dispatcher is started on the current Tokio runtime
    /// the first time it is needed, and again if its runtime has shut down.
    fn publish_comment(&self, post_id: PostId, comment: &Comment) {
        let Ok(mut queue) = self.inner.dispatch.lock() else {
            warn!(
                post_id = %post_id,
                comment_id = %comment.id,
                "Dispatch queue poisoned, notification skipped"
            );
            return;
        };

        let mut item = (post_id, comment.clone());
        if let Some(sender) = queue.as_ref() {
            match sender.send(item) {
                Ok(()) => return,
                Err(SendError(returned)) => item = returned,
            }
        }

        let Ok(handle) = Handle::try_current() else {
            warn!(
                post_id = %post_id,
                comment_id = %comment.id,
                "No async runtime, notification skipped"
            );
            return;
        };

        let sender = self.start_dispatcher(&handle);
        if sender.send(item).is_err() {
            warn!(
                post_id = %post_id,
                comment_id = %comment.id,
                "Runtime shutting down, notification skipped"
            );
        }
        *queue = Some(sender);
    }
}

/// Cancels one subscription.
///
/// Dropping this without calling [`Unsubscribe::cancel`] leaves the
/// listener registered until its `Subscription` is dropped.
#[derive(Debug)]
pub struct Unsubscribe {
    hub: NotificationHub,
    post_id: PostId,
    id: SubscriberId,
    cancelled: Arc<AtomicBool>,
}

impl Unsubscribe {
    /// Remove the listener and close its channel
    pub async fn cancel(self) {
        let removed = self.hub.unsubscribe(self.post_id, self.id).await;
        self.cancelled.store(true, Ordering::Release);
        debug!(post_id = %self.post_id, subscriber = self.id.0, removed, "Unsubscribed");
    }
}
