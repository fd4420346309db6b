//! Durable record of the last fully processed block height.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

use crate::sync::types::{SyncError, SyncResult};

/// Storage for the sync checkpoint.
///
/// `increment` must be atomic with respect to other users of the same store.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Highest fully processed height.
    async fn read(&self) -> SyncResult<u64>;

    /// Overwrite the stored height.
    async fn set(&self, height: u64) -> SyncResult<()>;

    /// Advance by exactly one and return the new height.
    async fn increment(&self) -> SyncResult<u64>;
}

/// Process-local checkpoint.
#[derive(Debug, Default)]
pub struct MemoryCheckpoint {
    height: AtomicU64,
}

impl MemoryCheckpoint {
    pub fn new(height: u64) -> Self {
        Self {
            height: AtomicU64::new(height),
        }
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpoint {
    async fn read(&self) -> SyncResult<u64> {
        Ok(self.height.load(Ordering::SeqCst))
    }

    async fn set(&self, height: u64) -> SyncResult<()> {
        self.height.store(height, Ordering::SeqCst);
        Ok(())
    }

    async fn increment(&self) -> SyncResult<u64> {
        Ok(self.height.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointFile {
    height: u64,
}

/// Checkpoint persisted as a small JSON document.
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a crash never leaves a half-written checkpoint.
#[derive(Debug)]
pub struct FileCheckpoint {
    path: PathBuf,
    /// Height reported while the file does not exist yet.
    start_height: u64,
    lock: Mutex<()>,
}

impl FileCheckpoint {
    pub fn new(path: impl Into<PathBuf>, start_height: u64) -> Self {
        Self {
            path: path.into(),
            start_height,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> SyncResult<u64> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str::<CheckpointFile>(&content)
                .map(|file| file.height)
                .map_err(|e| {
                    SyncError::Storage(format!("corrupt checkpoint {}: {}", self.path.display(), e))
                }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(self.start_height),
            Err(e) => Err(SyncError::Storage(format!(
                "failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn store(&self, height: u64) -> SyncResult<()> {
        let body = serde_json::to_vec(&CheckpointFile { height })
            .map_err(|e| SyncError::Storage(e.to_string()))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| SyncError::Storage(format!("failed to write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            SyncError::Storage(format!("failed to replace {}: {}", self.path.display(), e))
        })
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpoint {
    async fn read(&self) -> SyncResult<u64> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn set(&self, height: u64) -> SyncResult<()> {
        let _guard = self.lock.lock().await;
        self.store(height).await
    }

    async fn increment(&self) -> SyncResult<u64> {
        let _guard = self.lock.lock().await;
        let next = self.load().await? + 1;
        self.store(next).await?;
        Ok(next)
    }
}
