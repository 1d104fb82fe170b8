//! Live comment notifications
//!
//! The comment repository announces writes through [`CommentPublisher`];
//! [`NotificationHub`] fans them out to per-post listeners.

pub mod manager;
pub mod publisher;
pub mod subscription;

pub use manager::{HubStats, NotificationHub, Unsubscribe};
pub use publisher::CommentPublisher;
#[cfg(test)]
pub(crate) use publisher::recording::RecordingPublisher;
pub use subscription::{SubscriberId, Subscription, SubscriptionError, SubscriptionState};
