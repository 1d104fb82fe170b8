//! User data models

use crate::types::UserId;
use serde::{Deserialize, Serialize};

/// Public view of a registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

/// Stored form of a user, credential included.
///
/// Only snapshots carry this; API responses use [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(flatten)]
    pub user: User,
    /// Argon2id hash in PHC string format
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_flattens_user() {
        let record = UserRecord {
            user: User {
                id: UserId(3),
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
            },
            password_hash: "$argon2id$stub".to_string(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["username"], "alice");
        assert_eq!(json["passwordHash"], "$argon2id$stub");

        let back: UserRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
