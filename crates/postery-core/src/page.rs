//! Offset pagination

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};

/// One window of an ordered collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items in the window, possibly empty
    pub items: Vec<T>,
    /// True iff at least one item exists past the window
    pub has_more: bool,
    /// `offset + limit`, whatever the number of items returned
    pub next_offset: usize,
}

impl<T> Page<T> {
    /// An empty page that still advances the cursor
    pub fn empty(limit: usize, offset: usize) -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
            next_offset: offset.saturating_add(limit),
        }
    }

    /// Cut `[offset, offset + limit)` out of an already ordered sequence
    pub fn window(ordered: impl IntoIterator<Item = T>, limit: usize, offset: usize) -> Self {
        let mut rest = ordered.into_iter().skip(offset);
        let items: Vec<T> = rest.by_ref().take(limit).collect();
        let has_more = rest.next().is_some();

        Self {
            items,
            has_more,
            next_offset: offset.saturating_add(limit),
        }
    }

    /// Number of items in the window
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the window is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Check a requested page size against the configured ceiling
pub fn check_limit(limit: usize, max_page_size: usize) -> Result<()> {
    if limit == 0 {
        return Err(StoreError::InvalidArgument(
            "Page limit must be at least 1".to_string(),
        ));
    }
    if limit > max_page_size {
        return Err(StoreError::InvalidArgument(format!(
            "Page limit {} exceeds maximum of {}",
            limit, max_page_size
        )));
    }
    Ok(())
}
