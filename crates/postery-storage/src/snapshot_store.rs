//! File system storage for snapshots

use postery_core::config::StorageConfig;
use postery_core::error::{Result, StoreError};
use postery_core::snapshot::{
    SnapshotFile, SnapshotId, SnapshotInfo, SnapshotStorage, StoreSnapshot,
};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File system based snapshot storage.
///
/// Each snapshot is one pretty-printed JSON file named after its ID.
/// Writes go to a hidden temp file first and are renamed into place.
#[derive(Debug)]
pub struct FileSystemSnapshotStorage {
    /// Base directory for postery data
    base_dir: PathBuf,
    /// Snapshots subdirectory
    snapshots_dir: PathBuf,
}

impl FileSystemSnapshotStorage {
    /// Create storage rooted at `base_dir`, creating it if needed
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        let snapshots_dir = base_dir.join("snapshots");

        let storage = Self {
            base_dir,
            snapshots_dir,
        };

        storage.ensure_dirs()?;
        Ok(storage)
    }

    /// Create storage in the platform data directory (~/.postery fallback)
    pub fn default_location() -> Result<Self> {
        let base_dir = directories::ProjectDirs::from("org", "postery", "postery")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".postery")
            });

        Self::new(base_dir)
    }

    /// Create storage from the `[storage]` config section
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        match &config.snapshot_dir {
            Some(dir) => Self::new(dir.clone()),
            None => Self::default_location(),
        }
    }

    fn ensure_dirs(&self) -> Result<()> {
        if !self.snapshots_dir.exists() {
            fs::create_dir_all(&self.snapshots_dir).map_err(|e| {
                StoreError::Io(e).with_context(format!(
                    "Failed to create snapshots directory {}",
                    self.snapshots_dir.display()
                ))
            })?;
            debug!("Created snapshots directory: {:?}", self.snapshots_dir);
        }
        Ok(())
    }

    fn snapshot_path(&self, id: &SnapshotId) -> PathBuf {
        self.snapshots_dir.join(format!("{}.json", id))
    }

    fn temp_path(&self, id: &SnapshotId) -> PathBuf {
        self.snapshots_dir.join(format!(".{}.json.tmp", id))
    }

    /// Write snapshot atomically (write to temp, then rename)
    fn atomic_write(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let temp_path = self.temp_path(&snapshot.id);
        let final_path = self.snapshot_path(&snapshot.id);

        let file = SnapshotFile::seal(snapshot.clone())?;

        let temp_file = fs::File::create(&temp_path).map_err(|e| {
            StoreError::Io(e).with_context(format!("Failed to create {}", temp_path.display()))
        })?;
        let mut writer = BufWriter::new(temp_file);
        serde_json::to_writer_pretty(&mut writer, &file)?;
        writer.flush()?;
        drop(writer);

        if let Err(e) = fs::rename(&temp_path, &final_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(StoreError::Io(e)
                .with_context(format!("Failed to move snapshot into {}", final_path.display())));
        }

        info!(snapshot = %snapshot.id, path = ?final_path, "Saved snapshot");
        Ok(())
    }

    fn read_snapshot(&self, path: &Path) -> Result<StoreSnapshot> {
        let file = fs::File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                let id = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("unknown");
                StoreError::NotFound(format!("Snapshot {} not found", id))
            } else {
                StoreError::Io(e)
            }
        })?;

        let snapshot_file: SnapshotFile = serde_json::from_reader(BufReader::new(file))?;
        let snapshot = snapshot_file
            .open()
            .map_err(|e| e.with_context(format!("Reading {}", path.display())))?;

        debug!(snapshot = %snapshot.id, "Loaded snapshot");
        Ok(snapshot)
    }

    /// Get base directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get snapshots directory
    pub fn snapshots_dir(&self) -> &Path {
        &self.snapshots_dir
    }
}

fn is_snapshot_file(path: &Path) -> bool {
    let json = path.extension().map(|e| e == "json").unwrap_or(false);
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(true);
    json && !hidden
}

impl SnapshotStorage for FileSystemSnapshotStorage {
    fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        self.atomic_write(snapshot)
    }

    fn load(&self, id: &SnapshotId) -> Result<StoreSnapshot> {
        self.read_snapshot(&self.snapshot_path(id))
    }

    fn list(&self) -> Result<Vec<SnapshotInfo>> {
        let entries = fs::read_dir(&self.snapshots_dir).map_err(|e| {
            StoreError::Io(e).with_context(format!(
                "Failed to read {}",
                self.snapshots_dir.display()
            ))
        })?;

        let mut snapshots = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };

            if !is_snapshot_file(&path) {
                continue;
            }

            match self.read_snapshot(&path) {
                Ok(snapshot) => snapshots.push(snapshot.info()),
                Err(e) => warn!("Skipping unreadable snapshot {:?}: {}", path, e),
            }
        }

        snapshots.sort_by(|a, b| a.taken_at.cmp(&b.taken_at));
        Ok(snapshots)
    }

    fn delete(&self, id: &SnapshotId) -> Result<()> {
        let path = self.snapshot_path(id);

        if !path.exists() {
            return Err(StoreError::NotFound(format!("Snapshot {} not found", id)));
        }

        fs::remove_file(&path).map_err(|e| {
            StoreError::Io(e).with_context(format!("Failed to delete {}", path.display()))
        })?;

        debug!(snapshot = %id, "Deleted snapshot");
        Ok(())
    }

    fn exists(&self, id: &SnapshotId) -> bool {
        self.snapshot_path(id).exists()
    }
}
