//! End-to-end behaviour of posts and threaded comments

use postery_core::comment::CommentStore;
use postery_core::config::Config;
use postery_core::post::PostStore;
use postery_core::user::UserStore;
use postery_core::{CommentId, ContentStore, ErrorKind, PostId, UserId};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::sync::Arc;

fn store() -> ContentStore {
    ContentStore::new(Config::default()).unwrap()
}

fn signed_in(store: &ContentStore, name: &str) -> Option<UserId> {
    store
        .users()
        .register(name, &format!("{}@example.com", name), "pw")
        .unwrap();
    let token = store.users().login(name, "pw").unwrap();
    store.resolve_identity(token.as_str())
}

#[test]
fn root_comment_and_reply() {
    let store = store();
    let alice = signed_in(&store, "alice");
    let post = store.posts().create_post(alice, "Title", "Body").unwrap();

    let root = store
        .comments()
        .create_comment(alice, post.id, None, "first")
        .unwrap();
    assert_eq!(root.parent_id, None);

    let reply = store
        .comments()
        .create_comment(alice, post.id, Some(root.id), "second")
        .unwrap();

    let roots = store.comments().get_root_comments(post.id, 10, 0).unwrap();
    assert_eq!(roots.items.len(), 1);
    assert!(roots.items[0].has_replies);
    assert_eq!(roots.items[0].children, vec![reply.id]);

    let replies = store.comments().get_replies(root.id, 10, 0).unwrap();
    assert_eq!(replies.items, vec![reply]);
}

#[test]
fn toggling_comments_controls_creation() {
    let store = store();
    let alice = signed_in(&store, "alice");
    let bob = signed_in(&store, "bob");
    let post = store.posts().create_post(alice, "Title", "Body").unwrap();

    // Only the author may toggle
    let err = store
        .posts()
        .set_comments_enabled(bob, post.id, false)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    store.posts().set_comments_enabled(alice, post.id, false).unwrap();
    store.posts().set_comments_enabled(alice, post.id, true).unwrap();
    store.posts().set_comments_enabled(alice, post.id, false).unwrap();
    assert!(!store.posts().get_by_id(post.id).unwrap().comments_enabled());

    let err = store
        .comments()
        .create_comment(bob, post.id, None, "blocked")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FailedPrecondition);

    store.posts().set_comments_enabled(alice, post.id, true).unwrap();
    assert!(store
        .comments()
        .create_comment(bob, post.id, None, "welcome back")
        .is_ok());
}

#[test]
fn paging_walks_every_root_once_in_order() {
    let store = store();
    let alice = signed_in(&store, "alice");
    let post = store.posts().create_post(alice, "Title", "Body").unwrap();

    for i in 0..23 {
        let root = store
            .comments()
            .create_comment(alice, post.id, None, &format!("root {}", i))
            .unwrap();
        if i % 4 == 0 {
            store
                .comments()
                .create_comment(alice, post.id, Some(root.id), "reply")
                .unwrap();
        }
    }

    let mut seen = Vec::new();
    let mut offset = 0;
    loop {
        let page = store.comments().get_root_comments(post.id, 5, offset).unwrap();
        assert_eq!(page.next_offset, offset + 5);
        seen.extend(page.items);
        if !page.has_more {
            break;
        }
        offset = page.next_offset;
    }

    assert_eq!(seen.len(), 23);
    assert!(seen.iter().all(|c| c.parent_id.is_none()));
    assert!(seen
        .windows(2)
        .all(|w| (w[0].created_at, w[0].id) < (w[1].created_at, w[1].id)));
}

#[test]
fn content_length_limits() {
    let store = store();
    let alice = signed_in(&store, "alice");
    let post = store.posts().create_post(alice, "Title", "Body").unwrap();

    for bad in ["".to_string(), "x".repeat(2001)] {
        let err = store
            .comments()
            .create_comment(alice, post.id, None, &bad)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
    assert!(store
        .comments()
        .create_comment(alice, post.id, None, &"x".repeat(2000))
        .is_ok());
}

#[test]
fn anonymous_callers_cannot_write() {
    let store = store();
    assert_eq!(store.resolve_identity("forged"), None);

    let err = store.posts().create_post(None, "Title", "Body").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let alice = signed_in(&store, "alice");
    let post = store.posts().create_post(alice, "Title", "Body").unwrap();
    let err = store
        .comments()
        .create_comment(None, post.id, None, "hi")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[test]
fn ids_parse_from_wire_text() {
    assert_eq!(" 17 ".parse::<PostId>().unwrap(), PostId(17));
    let err = "seventeen".parse::<CommentId>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn concurrent_writers_get_unique_ids() {
    const WRITERS: usize = 8;
    const PER_WRITER: usize = 25;

    let store = Arc::new(store());
    let alice = signed_in(&store, "alice");
    let post = store.posts().create_post(alice, "Title", "Body").unwrap();
    let root = store
        .comments()
        .create_comment(alice, post.id, None, "thread")
        .unwrap();

    std::thread::scope(|scope| {
        for w in 0..WRITERS {
            let store = &store;
            scope.spawn(move || {
                for i in 0..PER_WRITER {
                    // Mix roots and replies to contend on both indexes
                    let parent = if i % 2 == 0 { None } else { Some(root.id) };
                    store
                        .comments()
                        .create_comment(alice, post.id, parent, &format!("{}-{}", w, i))
                        .unwrap();
                }
            });
        }
    });

    let mut ids = HashSet::new();
    let mut offset = 0;
    loop {
        let page = store.comments().get_root_comments(post.id, 50, offset).unwrap();
        ids.extend(page.items.iter().map(|c| c.id));
        if !page.has_more {
            break;
        }
        offset = page.next_offset;
    }
    let mut offset = 0;
    loop {
        let page = store.comments().get_replies(root.id, 50, offset).unwrap();
        ids.extend(page.items.iter().map(|c| c.id));
        if !page.has_more {
            break;
        }
        offset = page.next_offset;
    }

    assert_eq!(ids.len(), WRITERS * PER_WRITER + 1);
    assert_eq!(store.comments().count().unwrap(), WRITERS * PER_WRITER + 1);
}

#[test]
fn deleted_post_takes_its_thread_along() {
    let store = store();
    let alice = signed_in(&store, "alice");
    let post = store.posts().create_post(alice, "Title", "Body").unwrap();
    store
        .comments()
        .create_comment(alice, post.id, None, "gone soon")
        .unwrap();

    assert_eq!(store.delete_post(alice, post.id).unwrap(), 1);
    let err = store
        .comments()
        .get_root_comments(post.id, 10, 0)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
