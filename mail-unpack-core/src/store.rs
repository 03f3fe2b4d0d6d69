//! Object store backends.
//!
//! - [`FilesystemStore`]: buckets are directories under a root, keys are
//!   relative paths inside them.
//! - [`MemoryStore`]: a process-local map, used by tests and dry runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error};

use crate::config::StoreConfig;
use crate::contract::ObjectStore;
use crate::error::{Result, UnpackError};

/// Object store on the local filesystem.
#[derive(Debug, Clone)]
pub struct FilesystemStore {
    root: PathBuf,
}

impl FilesystemStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.root.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map bucket and key onto a path below the root.
    ///
    /// Empty key segments are skipped, so `/attachments/x` and
    /// `attachments/x` land on the same file. `.` and `..` segments are
    /// rejected.
    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        if !is_plain_segment(bucket) {
            return Err(UnpackError::storage(bucket, key, "invalid bucket name"));
        }
        if key.contains('\0') {
            return Err(UnpackError::storage(bucket, key, "key contains NUL byte"));
        }

        let mut path = self.root.join(bucket);
        let mut depth = 0;
        for segment in key.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." {
                return Err(UnpackError::storage(
                    bucket,
                    key,
                    "key escapes the bucket",
                ));
            }
            path.push(segment);
            depth += 1;
        }

        if depth == 0 {
            return Err(UnpackError::storage(bucket, key, "empty key"));
        }
        Ok(path)
    }
}

fn is_plain_segment(s: &str) -> bool {
    !s.is_empty() && s != "." && s != ".." && !s.contains(['/', '\\', '\0'])
}

#[async_trait]
impl ObjectStore for FilesystemStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        debug!(path = %path.display(), "Reading object");
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(UnpackError::not_found(bucket, key)),
            Err(e) => {
                error!(error = ?e, path = %path.display(), "Failed to read object");
                Err(UnpackError::storage(bucket, key, e.to_string()))
            }
        }
    }

    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                error!(error = ?e, dir = %parent.display(), "Failed to create object directory");
                UnpackError::storage(bucket, key, e.to_string())
            })?;
        }
        debug!(path = %path.display(), bytes = body.len(), "Writing object");
        tokio::fs::write(&path, body).await.map_err(|e| {
            error!(error = ?e, path = %path.display(), "Failed to write object");
            UnpackError::storage(bucket, key, e.to_string())
        })
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    objects: HashMap<(String, String), Vec<u8>>,
    puts: Vec<(String, String)>,
}

/// In-memory object store. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed an object without recording it as a put.
    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) {
        self.lock()
            .objects
            .insert((bucket.to_string(), key.to_string()), body.into());
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// All keys currently stored in `bucket`, sorted.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .lock()
            .objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Keys written through [`ObjectStore::put`], in call order.
    pub fn put_log(&self) -> Vec<String> {
        self.lock().puts.iter().map(|(_, k)| k.clone()).collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.object(bucket, key)
            .ok_or_else(|| UnpackError::not_found(bucket, key))
    }

    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        let mut state = self.lock();
        state.puts.push((bucket.to_string(), key.to_string()));
        state
            .objects
            .insert((bucket.to_string(), key.to_string()), body);
        Ok(())
    }
}
