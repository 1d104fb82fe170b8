//! Comment validation

use crate::config::DEFAULT_MAX_COMMENT_LENGTH;
use crate::error::{Result, StoreError};

/// Minimum comment length
pub const MIN_COMMENT_LENGTH: usize = 1;

/// Validator for comment bodies.
///
/// Lengths are counted in characters, not bytes, and the body is taken as
/// written: surrounding whitespace counts.
#[derive(Debug, Clone)]
pub struct CommentValidator {
    max_length: usize,
    min_length: usize,
}

impl CommentValidator {
    /// Create a new validator with default settings
    pub fn new() -> Self {
        Self::with_max_length(DEFAULT_MAX_COMMENT_LENGTH)
    }

    /// Create a new validator with custom max length
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            min_length: MIN_COMMENT_LENGTH,
        }
    }

    /// Maximum accepted length
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Validate comment content
    pub fn validate_content(&self, content: &str) -> Result<()> {
        let length = content.chars().count();

        if length < self.min_length {
            return Err(StoreError::InvalidArgument(
                "Comment content cannot be empty".to_string(),
            ));
        }

        if length > self.max_length {
            return Err(StoreError::InvalidArgument(format!(
                "Comment content is {} characters, maximum is {}",
                length, self.max_length
            )));
        }

        Ok(())
    }
}

impl Default for CommentValidator {
    fn default() -> Self {
        Self::new()
    }
}
