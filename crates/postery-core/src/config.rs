//! Configuration management for postery

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Maximum comment body length in characters
pub const DEFAULT_MAX_COMMENT_LENGTH: usize = 2000;

/// Largest page a reader may request
pub const DEFAULT_MAX_PAGE_SIZE: usize = 100;

/// How long a publish waits on a full subscriber slot
pub const DEFAULT_DELIVERY_TIMEOUT_MS: u64 = 500;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Comment settings
    pub comments: CommentConfig,
    /// Notification hub settings
    pub hub: HubConfig,
    /// Snapshot storage settings
    pub storage: StorageConfig,
}

impl Config {
    /// Load a configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            StoreError::Io(e).with_context(format!("Failed to read {}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| StoreError::Toml(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as pretty TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| StoreError::Toml(e.to_string()))
    }

    /// Reject settings the store cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.comments.max_length == 0 {
            return Err(StoreError::Config(
                "comments.max_length must be at least 1".to_string(),
            ));
        }
        if self.comments.max_page_size == 0 {
            return Err(StoreError::Config(
                "comments.max_page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Comment-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentConfig {
    /// Maximum comment content length, in characters
    pub max_length: usize,
    /// Maximum `limit` accepted by the paginated readers
    pub max_page_size: usize,
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_COMMENT_LENGTH,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

/// Notification hub configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Bounded wait per subscriber when its one-slot buffer is full
    pub delivery_timeout_ms: u64,
}

impl HubConfig {
    /// Delivery timeout as a `Duration`
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            delivery_timeout_ms: DEFAULT_DELIVERY_TIMEOUT_MS,
        }
    }
}

/// Snapshot storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for snapshot files; platform data dir when unset
    pub snapshot_dir: Option<PathBuf>,
}
