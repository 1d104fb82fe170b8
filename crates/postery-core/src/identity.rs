//! Caller identity as seen by the store
//!
//! The store never parses credentials. The auth boundary resolves a request
//! into `Option<UserId>` and every mutating operation takes that value as is.

use crate::error::{Result, StoreError};
use crate::types::UserId;

/// Turns an opaque credential back into a caller identity
pub trait IdentityResolver: Send + Sync {
    /// Resolve a token, `None` when it is unknown or revoked
    fn resolve_identity(&self, token: &str) -> Option<UserId>;
}

/// Require an identity for a mutating call
pub fn require_identity(caller: Option<UserId>, action: &str) -> Result<UserId> {
    caller.ok_or_else(|| StoreError::Unauthorized(format!("{} requires a signed-in user", action)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_require_identity() {
        assert_eq!(require_identity(Some(UserId(4)), "create post").unwrap(), UserId(4));

        let err = require_identity(None, "create post").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(err.to_string().contains("create post"));
    }
}
