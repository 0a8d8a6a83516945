//! Versioned key-value backends
//!
//! Each key holds one JSON value and a version counter. Writers must name
//! the version they read; a stale version is rejected instead of silently
//! overwriting a concurrent update.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnimeError, Result};

/// A stored value with its version. Absent keys are at version 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedBlob {
    pub version: u64,
    pub value: serde_json::Value,
}

/// Key-value storage with compare-and-swap writes
pub trait BlobStore: Send + Sync {
    /// Current blob under `key`, if any
    fn get(&self, key: &str) -> Result<Option<VersionedBlob>>;

    /// Replace the blob under `key` if its version is still `expected`.
    ///
    /// Returns the new version. Fails with `AnimeError::VersionConflict`
    /// when another writer got there first.
    fn compare_and_swap(&self, key: &str, expected: u64, value: serde_json::Value) -> Result<u64>;
}

fn lock_poisoned<T>(_: T) -> AnimeError {
    AnimeError::Storage("store lock poisoned".to_string())
}

/// In-process store, lost on exit
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, VersionedBlob>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<VersionedBlob>> {
        let blobs = self.blobs.lock().map_err(lock_poisoned)?;
        Ok(blobs.get(key).cloned())
    }

    fn compare_and_swap(&self, key: &str, expected: u64, value: serde_json::Value) -> Result<u64> {
        let mut blobs = self.blobs.lock().map_err(lock_poisoned)?;
        let actual = blobs.get(key).map_or(0, |blob| blob.version);
        if actual != expected {
            return Err(AnimeError::VersionConflict { expected, actual });
        }

        let version = actual + 1;
        blobs.insert(key.to_string(), VersionedBlob { version, value });
        Ok(version)
    }
}

/// One JSON file per key under a directory
///
/// Writes go to a temporary file that is then renamed over the old one, so
/// readers never see a half-written blob. The version check is atomic
/// within one process.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "opened file store");
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(AnimeError::InvalidArgument(format!(
                "Store keys must be alphanumeric, got {:?}",
                key
            )));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    fn read(&self, path: &Path) -> Result<Option<VersionedBlob>> {
        match fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| AnimeError::Storage(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl BlobStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<VersionedBlob>> {
        let path = self.path_for(key)?;
        self.read(&path)
    }

    fn compare_and_swap(&self, key: &str, expected: u64, value: serde_json::Value) -> Result<u64> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock().map_err(lock_poisoned)?;

        let actual = self.read(&path)?.map_or(0, |blob| blob.version);
        if actual != expected {
            return Err(AnimeError::VersionConflict { expected, actual });
        }

        let blob = VersionedBlob {
            version: actual + 1,
            value,
        };
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(&blob)?)?;
        fs::rename(&tmp, &path)?;

        Ok(blob.version)
    }
}
