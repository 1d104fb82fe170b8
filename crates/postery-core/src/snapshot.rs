//! Point-in-time copies of the whole store
//!
//! A [`StoreSnapshot`] holds every post, comment and user record plus the
//! identifier counters. On disk it is wrapped in a [`SnapshotFile`] that
//! carries the schema version and a blake3 checksum of the snapshot body.

use crate::comment::Comment;
use crate::error::{Result, StoreError};
use crate::post::Post;
use crate::types::ProtocolVersion;
use crate::user::UserRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::info;
use uuid::Uuid;

/// Current schema version
pub const CURRENT_SCHEMA_VERSION: &str = "1.0";

/// Unique identifier for a snapshot.
/// Format: YYYYMMDDHHMMSS-<8 hex digits>
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(pub String);

impl SnapshotId {
    /// Generate a new SnapshotId
    pub fn generate() -> Self {
        let now = Utc::now();
        let uuid = Uuid::new_v4().simple().to_string();
        SnapshotId(format!("{}-{}", now.format("%Y%m%d%H%M%S"), &uuid[..8]))
    }

    /// Parse user input; IDs double as file names
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let valid = !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if valid {
            Ok(SnapshotId(s.to_string()))
        } else {
            Err(StoreError::InvalidArgument(format!(
                "Invalid snapshot ID: {:?}",
                s
            )))
        }
    }

    /// Get the string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything needed to rebuild a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub id: SnapshotId,
    pub taken_at: DateTime<Utc>,
    pub posts: Vec<Post>,
    pub next_post_id: u64,
    pub comments: Vec<Comment>,
    pub next_comment_id: u64,
    pub users: Vec<UserRecord>,
    pub next_user_id: u64,
}

impl StoreSnapshot {
    /// Summary without the records
    pub fn info(&self) -> SnapshotInfo {
        SnapshotInfo::from(self)
    }

    /// Check that every comment belongs to a post in the snapshot
    pub fn check_post_references(&self) -> Result<()> {
        let mut known: Vec<_> = self.posts.iter().map(|p| p.id).collect();
        known.sort();

        for comment in &self.comments {
            if known.binary_search(&comment.post_id).is_err() {
                return Err(StoreError::InvalidArgument(format!(
                    "Comment {} refers to missing post {}",
                    comment.id, comment.post_id
                )));
            }
        }
        Ok(())
    }
}

/// Lightweight snapshot summary for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotInfo {
    pub id: SnapshotId,
    pub taken_at: DateTime<Utc>,
    pub post_count: usize,
    pub comment_count: usize,
    pub user_count: usize,
}

impl From<&StoreSnapshot> for SnapshotInfo {
    fn from(snapshot: &StoreSnapshot) -> Self {
        Self {
            id: snapshot.id.clone(),
            taken_at: snapshot.taken_at,
            post_count: snapshot.posts.len(),
            comment_count: snapshot.comments.len(),
            user_count: snapshot.users.len(),
        }
    }
}

/// On-disk envelope for a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    /// Schema version for migration
    pub schema_version: String,
    /// blake3 hex digest of the JSON-encoded snapshot
    pub checksum: String,
    /// The snapshot data
    pub snapshot: StoreSnapshot,
    /// Extra fields for forward compatibility
    #[serde(flatten, default)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl SnapshotFile {
    /// Wrap a snapshot at the current schema version
    pub fn seal(snapshot: StoreSnapshot) -> Result<Self> {
        Ok(Self {
            schema_version: CURRENT_SCHEMA_VERSION.to_string(),
            checksum: checksum(&snapshot)?,
            snapshot,
            extra: HashMap::new(),
        })
    }

    /// Parse schema version
    pub fn parse_version(&self) -> Option<ProtocolVersion> {
        ProtocolVersion::parse(&self.schema_version)
    }

    /// Check the schema version and checksum, then unwrap
    pub fn open(self) -> Result<StoreSnapshot> {
        let version = self.parse_version().ok_or_else(|| {
            StoreError::UnsupportedSchemaVersion(format!(
                "Invalid schema version format: {:?}",
                self.schema_version
            ))
        })?;

        let current = ProtocolVersion::V1_0;
        if !version.is_compatible(&current) {
            return Err(StoreError::UnsupportedSchemaVersion(format!(
                "{} (expected {}.x)",
                self.schema_version, current.major
            )));
        }
        if self.schema_version != CURRENT_SCHEMA_VERSION {
            info!(
                "Reading snapshot written at schema {} as {}",
                self.schema_version, CURRENT_SCHEMA_VERSION
            );
        }

        let actual = checksum(&self.snapshot)?;
        if actual != self.checksum {
            return Err(StoreError::InvalidArgument(format!(
                "Snapshot {} checksum mismatch",
                self.snapshot.id
            )));
        }

        Ok(self.snapshot)
    }
}

fn checksum(snapshot: &StoreSnapshot) -> Result<String> {
    let bytes = serde_json::to_vec(snapshot)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

/// Trait for snapshot storage implementations
pub trait SnapshotStorage: Send + Sync {
    /// Save a snapshot
    fn save(&self, snapshot: &StoreSnapshot) -> Result<()>;

    /// Load a snapshot by ID
    fn load(&self, id: &SnapshotId) -> Result<StoreSnapshot>;

    /// List all snapshots (as info)
    fn list(&self) -> Result<Vec<SnapshotInfo>>;

    /// Delete a snapshot
    fn delete(&self, id: &SnapshotId) -> Result<()>;

    /// Check if a snapshot exists
    fn exists(&self, id: &SnapshotId) -> bool;

    /// Get the most recently taken snapshot
    fn latest(&self) -> Result<Option<StoreSnapshot>> {
        let newest = self
            .list()?
            .into_iter()
            .max_by(|a, b| a.taken_at.cmp(&b.taken_at).then_with(|| a.id.cmp(&b.id)));

        match newest {
            Some(info) => self.load(&info.id).map(Some),
            None => Ok(None),
        }
    }
}

/// In-memory storage for testing
#[cfg(test)]
pub mod memory {
    use super::*;
    use std::sync::RwLock;

    /// Keeps sealed files as JSON text, so reads go through `open`
    #[derive(Default)]
    pub struct MemoryStorage {
        files: RwLock<HashMap<SnapshotId, String>>,
    }

    impl MemoryStorage {
        pub fn new() -> Self {
            Self::default()
        }

        /// Overwrite a stored file, for corruption tests
        pub fn put_raw(&self, id: SnapshotId, json: String) {
            self.files.write().unwrap().insert(id, json);
        }

        pub fn raw(&self, id: &SnapshotId) -> Option<String> {
            self.files.read().unwrap().get(id).cloned()
        }
    }

    impl SnapshotStorage for MemoryStorage {
        fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
            let file = SnapshotFile::seal(snapshot.clone())?;
            let json = serde_json::to_string(&file)?;
            self.files.write().unwrap().insert(snapshot.id.clone(), json);
            Ok(())
        }

        fn load(&self, id: &SnapshotId) -> Result<StoreSnapshot> {
            let json = self
                .raw(id)
                .ok_or_else(|| StoreError::NotFound(format!("Snapshot {} not found", id)))?;
            let file: SnapshotFile = serde_json::from_str(&json)?;
            file.open()
        }

        fn list(&self) -> Result<Vec<SnapshotInfo>> {
            let ids: Vec<SnapshotId> = self.files.read().unwrap().keys().cloned().collect();
            ids.iter().map(|id| self.load(id).map(|s| s.info())).collect()
        }

        fn delete(&self, id: &SnapshotId) -> Result<()> {
            self.files
                .write()
                .unwrap()
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| StoreError::NotFound(format!("Snapshot {} not found", id)))
        }

        fn exists(&self, id: &SnapshotId) -> bool {
            self.files.read().unwrap().contains_key(id)
        }
    }
}
