//! In-memory blob store.

use crate::BlobStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tagvault_core::MediaSource;
use tagvault_error::{MediaResult, StorageError, StorageErrorKind};
use tokio::io::AsyncReadExt;
use tokio::sync::RwLock;

/// Blob store keeping content in memory.
///
/// Presigned URLs use the `memory://` scheme and are only meaningful to the
/// process holding the store.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    puts: Arc<AtomicUsize>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Content stored under `key`.
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.read().await.get(key).cloned()
    }

    /// Number of `put` calls that completed.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    #[tracing::instrument(skip(self, source))]
    async fn put(&self, key: &str, source: &mut dyn MediaSource) -> MediaResult<()> {
        let mut content = Vec::new();
        source.read_to_end(&mut content).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!("{}: {}", key, e)))
        })?;

        tracing::debug!(size = content.len(), "Stored blob in memory");
        self.blobs.write().await.insert(key.to_string(), content);
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn presign_get(&self, key: &str, lifetime: Duration) -> MediaResult<String> {
        if !self.blobs.read().await.contains_key(key) {
            return Err(StorageError::new(StorageErrorKind::NotFound(key.to_string())).into());
        }
        Ok(format!("memory://{}?ttl={}", key, lifetime.as_secs()))
    }

    async fn delete_all(&self, keys: &[String]) -> MediaResult<()> {
        let mut blobs = self.blobs.write().await;
        for key in keys {
            blobs.remove(key);
        }
        Ok(())
    }
}
