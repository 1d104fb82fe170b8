//! postery-storage - Storage library for postery
//!
//! This crate persists store snapshots on the local file system.

mod snapshot_store;

pub use snapshot_store::FileSystemSnapshotStorage;
