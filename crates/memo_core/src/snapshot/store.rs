//! `SnapshotStore` implementations.

use super::{validate_key, SnapshotResult, SnapshotStore};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const SNAPSHOT_FILE_EXTENSION: &str = "json";

/// Stores each key as `<dir>/<key>.json`.
///
/// Writes go to a temporary sibling file first and are renamed into place, so
/// a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    /// The directory is created lazily on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{SNAPSHOT_FILE_EXTENSION}"))
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn read(&self, key: &str) -> SnapshotResult<Option<String>> {
        validate_key(key)?;
        match fs::read_to_string(self.path_for(key)) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, key: &str, blob: &str) -> SnapshotResult<()> {
        validate_key(key)?;
        fs::create_dir_all(&self.dir)?;
        let target = self.path_for(key);
        let staging = self.dir.join(format!(".{key}.{SNAPSHOT_FILE_EXTENSION}.tmp"));
        fs::write(&staging, blob)?;
        fs::rename(&staging, &target)?;
        Ok(())
    }
}

/// Process-local store, mainly for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn blobs(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn read(&self, key: &str) -> SnapshotResult<Option<String>> {
        validate_key(key)?;
        Ok(self.blobs().get(key).cloned())
    }

    fn write(&self, key: &str, blob: &str) -> SnapshotResult<()> {
        validate_key(key)?;
        self.blobs().insert(key.to_string(), blob.to_string());
        Ok(())
    }
}
