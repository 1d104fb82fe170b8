//! Core type definitions for postery

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::StoreError;

/// Declares a numeric, monotonically assigned identifier.
///
/// Identifiers travel as strings on the wire (`"17"`), so `FromStr` is the
/// parsing boundary and reports malformed text as `InvalidArgument`.
macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Get the raw numeric value
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = StoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u64>().map($name).map_err(|_| {
                    StoreError::InvalidArgument(format!("Malformed {} ID: {:?}", $label, s))
                })
            }
        }
    };
}

numeric_id!(
    /// Unique identifier for a post
    PostId,
    "post"
);

numeric_id!(
    /// Unique identifier for a comment
    CommentId,
    "comment"
);

numeric_id!(
    /// Unique identifier for a user; doubles as the resolved caller identity
    UserId,
    "user"
);

/// Monotonic identifier allocator, always used under its owner's lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdSequence(u64);

impl IdSequence {
    /// Start a sequence whose first value is 1
    pub fn new() -> Self {
        IdSequence(1)
    }

    /// Resume a sequence at the given next value
    pub fn starting_at(next: u64) -> Self {
        IdSequence(next.max(1))
    }

    /// Take the next value
    pub fn next_value(&mut self) -> u64 {
        let value = self.0;
        self.0 += 1;
        value
    }

    /// Peek at the value the next call will return
    pub fn peek(&self) -> u64 {
        self.0
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque login session token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(pub String);

impl SessionToken {
    /// Generate a fresh random token
    pub fn generate() -> Self {
        SessionToken(Uuid::new_v4().simple().to_string())
    }

    /// Get the string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Protocol version for snapshot compatibility
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolVersion {
    pub major: u32,
    pub minor: u32,
}

impl ProtocolVersion {
    pub const V1_0: Self = Self { major: 1, minor: 0 };

    /// Check if this version is compatible with another version
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.major == other.major
    }

    /// Parse a `major.minor` string
    pub fn parse(s: &str) -> Option<Self> {
        let (major, minor) = s.split_once('.')?;
        Some(Self {
            major: major.parse().ok()?,
            minor: minor.parse().ok()?,
        })
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::V1_0
    }
}
