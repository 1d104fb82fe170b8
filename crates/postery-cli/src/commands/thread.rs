//! Comment tree rendering shared by `demo` and `inspect`

use anyhow::Result;
use colored::Colorize;
use postery_core::comment::{Comment, CommentStore};
use postery_core::page::Page;
use postery_core::types::PostId;

/// Fetch every page of a paged listing
fn collect_pages(
    page_size: usize,
    mut fetch: impl FnMut(usize, usize) -> postery_core::Result<Page<Comment>>,
) -> Result<Vec<Comment>> {
    let mut all = Vec::new();
    let mut offset = 0;
    loop {
        let page = fetch(page_size, offset)?;
        all.extend(page.items);
        if !page.has_more {
            return Ok(all);
        }
        offset = page.next_offset;
    }
}

/// Walk a post's thread depth-first, returning `(depth, comment)` pairs
/// in reading order. Replies are fetched one parent at a time.
pub fn collect_thread(
    comments: &dyn CommentStore,
    post_id: PostId,
    page_size: usize,
) -> Result<Vec<(usize, Comment)>> {
    let roots = collect_pages(page_size, |limit, offset| {
        comments.get_root_comments(post_id, limit, offset)
    })?;

    let mut stack: Vec<(usize, Comment)> = roots.into_iter().rev().map(|c| (0, c)).collect();
    let mut thread = Vec::new();

    while let Some((depth, comment)) = stack.pop() {
        if comment.has_replies {
            let replies = collect_pages(page_size, |limit, offset| {
                comments.get_replies(comment.id, limit, offset)
            })?;
            stack.extend(replies.into_iter().rev().map(|c| (depth + 1, c)));
        }
        thread.push((depth, comment));
    }

    Ok(thread)
}

/// Print one comment line
pub fn print_comment(depth: usize, comment: &Comment) {
    println!(
        "{}{} {} {}",
        "  ".repeat(depth + 1),
        format!("#{}", comment.id).cyan(),
        format!("user {}", comment.author_id).dimmed(),
        comment.content
    );
}

/// Print a post's whole thread, returning the number of comments shown
pub fn print_thread(comments: &dyn CommentStore, post_id: PostId, page_size: usize) -> Result<usize> {
    let thread = collect_thread(comments, post_id, page_size)?;

    if thread.is_empty() {
        println!("  {}", "(no comments)".dimmed());
    }
    for (depth, comment) in &thread {
        print_comment(*depth, comment);
    }

    Ok(thread.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use postery_core::config::Config;
    use postery_core::post::PostStore;
    use postery_core::{ContentStore, UserId};

    #[test]
    fn test_collect_thread_order_and_depth() {
        let store = ContentStore::new(Config::default()).unwrap();
        let author = Some(UserId(1));
        let post = store.posts().create_post(author, "Title", "Body").unwrap();
        let comments = store.comments();

        let a = comments.create_comment(author, post.id, None, "a").unwrap();
        let b = comments.create_comment(author, post.id, None, "b").unwrap();
        let a1 = comments.create_comment(author, post.id, Some(a.id), "a1").unwrap();
        comments.create_comment(author, post.id, Some(a1.id), "a1x").unwrap();
        comments.create_comment(author, post.id, Some(a.id), "a2").unwrap();
        comments.create_comment(author, post.id, Some(b.id), "b1").unwrap();

        // Page size 1 forces every listing through several pages
        let thread = collect_thread(&**comments, post.id, 1).unwrap();
        let shape: Vec<(usize, &str)> = thread
            .iter()
            .map(|(d, c)| (*d, c.content.as_str()))
            .collect();

        assert_eq!(
            shape,
            vec![(0, "a"), (1, "a1"), (2, "a1x"), (1, "a2"), (0, "b"), (1, "b1")]
        );
    }

    #[test]
    fn test_collect_thread_empty_post() {
        let store = ContentStore::new(Config::default()).unwrap();
        let post = store
            .posts()
            .create_post(Some(UserId(1)), "Quiet", "Body")
            .unwrap();

        let thread = collect_thread(&**store.comments(), post.id, 10).unwrap();
        assert!(thread.is_empty());
    }
}
