//! Durable byte storage for the cache's second tier

use crate::{Result, SourceError};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Key-addressed byte store that outlives the process
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Stored bytes, or `None` when the key was never written
    async fn read(&self, key: &str) -> Result<Option<Bytes>>;

    async fn write(&self, key: &str, data: &[u8]) -> Result<()>;

    async fn exists(&self, key: &str) -> bool;
}

/// [`DurableStore`] keeping one file per key in a directory
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

impl FsStore {
    /// Store rooted at `root`; the directory is created on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at `root`, creating the directory now
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(root);
        tokio::fs::create_dir_all(&store.root)
            .await
            .map_err(|e| SourceError::Store {
                key: store.root.display().to_string(),
                source: e,
            })?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl DurableStore for FsStore {
    async fn read(&self, key: &str) -> Result<Option<Bytes>> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SourceError::Store {
                key: key.to_string(),
                source: e,
            }),
        }
    }

    async fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        let store_err = |source| SourceError::Store {
            key: key.to_string(),
            source,
        };

        tokio::fs::create_dir_all(&self.root).await.map_err(store_err)?;

        // Write to a unique temp file and rename so readers never see a partial image
        let temp = self.root.join(format!(
            ".{key}.{}.{}.tmp",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        tokio::fs::write(&temp, data).await.map_err(store_err)?;
        if let Err(e) = tokio::fs::rename(&temp, self.path_for(key)).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(store_err(e));
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> bool {
        tokio::fs::try_exists(self.path_for(key))
            .await
            .unwrap_or(false)
    }
}
