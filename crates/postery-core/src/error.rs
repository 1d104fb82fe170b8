//! Error types for postery

use thiserror::Error;

/// Main error type for the content store
#[derive(Debug, Error)]
pub enum StoreError {
    /// No caller identity on a mutating call
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is not the owner of the resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Post, comment, parent or user is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Content length violation, malformed identifier, bad page window
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Target post has comments disabled
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    /// Duplicate username or email
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Login password mismatch
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unsupported snapshot schema version
    #[error("Unsupported schema version: {0}")]
    UnsupportedSchemaVersion(String),

    /// Internal failure (hashing, poisoned lock)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<StoreError>,
    },
}

/// Fieldless classification of a [`StoreError`], for mapping onto
/// transport-level status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    InvalidArgument,
    FailedPrecondition,
    AlreadyExists,
    InvalidCredential,
    Internal,
}

impl StoreError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        StoreError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Classify the error, looking through any context wrappers
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Unauthorized(_) => ErrorKind::Unauthorized,
            StoreError::Forbidden(_) => ErrorKind::Forbidden,
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            StoreError::FailedPrecondition(_) => ErrorKind::FailedPrecondition,
            StoreError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            StoreError::InvalidCredential(_) => ErrorKind::InvalidCredential,
            StoreError::WithContext { source, .. } => source.kind(),
            StoreError::Io(_)
            | StoreError::Serde(_)
            | StoreError::Toml(_)
            | StoreError::Config(_)
            | StoreError::UnsupportedSchemaVersion(_)
            | StoreError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn poisoned(what: &str) -> Self {
        StoreError::Internal(format!("{} lock poisoned", what))
    }
}

/// Result type alias for postery
pub type Result<T> = std::result::Result<T, StoreError>;
