//! Wiring of repositories and the notification hub

use crate::comment::{CommentRepository, CommentStore};
use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::hub::{CommentPublisher, NotificationHub};
use crate::identity::IdentityResolver;
use crate::post::{Post, PostRepository, PostStore};
use crate::snapshot::{SnapshotId, StoreSnapshot};
use crate::types::{PostId, UserId};
use crate::user::UserRepository;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// Posts as seen through a [`ContentStore`].
///
/// Deleting a post here also removes every comment under it.
#[derive(Clone)]
pub struct StorePosts {
    repo: Arc<PostRepository>,
    comments: Arc<CommentRepository>,
}

impl StorePosts {
    fn new(repo: Arc<PostRepository>, comments: Arc<CommentRepository>) -> Self {
        Self { repo, comments }
    }

    /// Delete a post and its comments, returning how many comments went
    pub fn delete_with_comments(&self, caller: Option<UserId>, id: PostId) -> Result<usize> {
        // Post first: once it is gone no new comment can attach to it
        self.repo.delete(caller, id)?;
        let purged = self.comments.purge_post(id)?;

        info!(post_id = %id, comments = purged, "Post deleted with its comments");
        Ok(purged)
    }

    /// Get total post count
    pub fn count(&self) -> Result<usize> {
        self.repo.count()
    }
}

impl PostStore for StorePosts {
    fn create_post(&self, caller: Option<UserId>, title: &str, content: &str) -> Result<Post> {
        self.repo.create_post(caller, title, content)
    }

    fn get_by_id(&self, id: PostId) -> Result<Post> {
        self.repo.get_by_id(id)
    }

    fn list_all(&self) -> Result<Vec<Post>> {
        self.repo.list_all()
    }

    fn set_comments_enabled(
        &self,
        caller: Option<UserId>,
        id: PostId,
        enabled: bool,
    ) -> Result<()> {
        self.repo.set_comments_enabled(caller, id, enabled)
    }

    fn delete(&self, caller: Option<UserId>, id: PostId) -> Result<()> {
        self.delete_with_comments(caller, id).map(|_| ())
    }

    fn exists(&self, id: PostId) -> bool {
        self.repo.exists(id)
    }
}

/// A complete content store: posts, threaded comments, users, and live
/// notifications, sharing one configuration.
pub struct ContentStore {
    config: Config,
    posts: StorePosts,
    comments: Arc<CommentRepository>,
    users: Arc<UserRepository>,
    hub: NotificationHub,
}

impl std::fmt::Debug for ContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ContentStore {
    /// Create an empty store
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let posts = Arc::new(PostRepository::new());
        let hub = NotificationHub::with_config(config.hub.clone());
        let comments = Arc::new(CommentRepository::with_config(
            posts.clone(),
            Arc::new(hub.clone()),
            &config.comments,
        ));

        Ok(Self {
            config,
            posts: StorePosts::new(posts, comments.clone()),
            comments,
            users: Arc::new(UserRepository::new()),
            hub,
        })
    }

    /// Rebuild a store from a snapshot.
    ///
    /// Inconsistent snapshots are rejected rather than repaired.
    pub fn from_snapshot(config: Config, snapshot: StoreSnapshot) -> Result<Self> {
        config.validate()?;
        snapshot
            .check_post_references()
            .map_err(|e| e.with_context(format!("Restoring snapshot {}", snapshot.id)))?;

        let snapshot_id = snapshot.id.clone();
        let posts = Arc::new(PostRepository::from_records(
            snapshot.posts,
            snapshot.next_post_id,
        ));
        let hub = NotificationHub::with_config(config.hub.clone());
        let publisher: Arc<dyn CommentPublisher> = Arc::new(hub.clone());
        let comments = CommentRepository::from_records(
            posts.clone(),
            publisher,
            &config.comments,
            snapshot.comments,
            snapshot.next_comment_id,
        )
        .map_err(|e| e.with_context(format!("Restoring snapshot {}", snapshot_id)))?;
        let users = UserRepository::from_records(snapshot.users, snapshot.next_user_id)
            .map_err(|e| e.with_context(format!("Restoring snapshot {}", snapshot_id)))?;

        info!(
            snapshot = %snapshot_id,
            posts = posts.count()?,
            comments = comments.count()?,
            users = users.count()?,
            "Store restored"
        );

        let comments = Arc::new(comments);
        Ok(Self {
            config,
            posts: StorePosts::new(posts, comments.clone()),
            comments,
            users: Arc::new(users),
            hub,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Posts; deleting through this handle cascades to comments
    pub fn posts(&self) -> &StorePosts {
        &self.posts
    }

    /// Comment repository
    pub fn comments(&self) -> &Arc<CommentRepository> {
        &self.comments
    }

    /// User repository
    pub fn users(&self) -> &Arc<UserRepository> {
        &self.users
    }

    /// Notification hub that receives every new comment
    pub fn hub(&self) -> &NotificationHub {
        &self.hub
    }

    /// Resolve a session token issued by [`UserRepository`]
    pub fn resolve_identity(&self, token: &str) -> Option<UserId> {
        self.users.resolve_identity(token)
    }

    /// Delete a post and every comment under it.
    ///
    /// Returns the number of comments removed.
    pub fn delete_post(&self, caller: Option<UserId>, id: PostId) -> Result<usize> {
        self.posts.delete_with_comments(caller, id)
    }

    /// Copy the whole store.
    ///
    /// Comments are copied before posts, so every copied comment's post is
    /// present unless it was deleted in between.
    pub fn snapshot(&self) -> Result<StoreSnapshot> {
        let (comments, next_comment_id) = self.comments.records()?;
        let (posts, next_post_id) = self.posts.repo.records()?;
        let (users, next_user_id) = self.users.records()?;

        let snapshot = StoreSnapshot {
            id: SnapshotId::generate(),
            taken_at: Utc::now(),
            posts,
            next_post_id,
            comments,
            next_comment_id,
            users,
            next_user_id,
        };

        if let Err(e) = snapshot.check_post_references() {
            return Err(StoreError::FailedPrecondition(format!(
                "Store changed while copying: {}",
                e
            )));
        }

        info!(
            snapshot = %snapshot.id,
            posts = snapshot.posts.len(),
            comments = snapshot.comments.len(),
            "Snapshot taken"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::user::UserStore;
    use pretty_assertions::assert_eq;

    const ALICE: Option<UserId> = Some(UserId(1));
    const BOB: Option<UserId> = Some(UserId(2));

    fn store() -> ContentStore {
        ContentStore::new(Config::default()).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = Config::default();
        config.comments.max_page_size = 0;
        assert!(ContentStore::new(config).is_err());
    }

    #[test]
    fn test_delete_post_cascades() {
        let store = store();
        let post = store.posts().create_post(ALICE, "Title", "Body").unwrap();
        let root = store
            .comments()
            .create_comment(BOB, post.id, None, "root")
            .unwrap();
        store
            .comments()
            .create_comment(ALICE, post.id, Some(root.id), "reply")
            .unwrap();

        let err = store.delete_post(BOB, post.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(store.comments().count().unwrap(), 2);

        assert_eq!(store.delete_post(ALICE, post.id).unwrap(), 2);
        assert_eq!(store.comments().count().unwrap(), 0);
        assert!(store.comments().get_comment(root.id).is_err());
    }

    #[test]
    fn test_post_handle_delete_cascades() {
        let store = store();
        let post = store.posts().create_post(ALICE, "Title", "Body").unwrap();
        let root = store
            .comments()
            .create_comment(BOB, post.id, None, "root")
            .unwrap();
        let reply = store
            .comments()
            .create_comment(ALICE, post.id, Some(root.id), "reply")
            .unwrap();

        store.posts().delete(ALICE, post.id).unwrap();

        assert!(!store.posts().exists(post.id));
        assert_eq!(store.comments().count().unwrap(), 0);
        assert_eq!(
            store.comments().get_comment(reply.id).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            store.comments().get_replies(root.id, 10, 0).unwrap_err().kind(),
            ErrorKind::NotFound
        );

        // Snapshots keep working after the delete
        for _ in 0..2 {
            let snapshot = store.snapshot().unwrap();
            assert!(snapshot.posts.is_empty());
            assert!(snapshot.comments.is_empty());
        }
    }

    #[test]
    fn test_snapshot_and_restore() {
        let store = store();
        let user = store.users().register("alice", "a@example.com", "pw").unwrap();
        let caller = Some(user.id);
        let post = store.posts().create_post(caller, "Title", "Body").unwrap();
        let root = store
            .comments()
            .create_comment(caller, post.id, None, "root")
            .unwrap();
        store
            .comments()
            .create_comment(caller, post.id, Some(root.id), "reply")
            .unwrap();
        store
            .posts()
            .set_comments_enabled(caller, post.id, false)
            .unwrap();

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.info().comment_count, 2);

        let restored = ContentStore::from_snapshot(Config::default(), snapshot).unwrap();
        assert!(!restored.posts().get_by_id(post.id).unwrap().comments_enabled());
        assert!(restored.comments().get_comment(root.id).unwrap().has_replies);

        let token = restored.users().login("alice", "pw").unwrap();
        assert_eq!(restored.resolve_identity(token.as_str()), Some(user.id));
    }

    #[test]
    fn test_restore_rejects_orphans() {
        let store = store();
        let post = store.posts().create_post(ALICE, "Title", "Body").unwrap();
        store
            .comments()
            .create_comment(ALICE, post.id, None, "root")
            .unwrap();

        let mut snapshot = store.snapshot().unwrap();
        snapshot.posts.clear();

        let err = ContentStore::from_snapshot(Config::default(), snapshot).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
