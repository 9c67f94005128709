//! Metadata store persisted to a JSON snapshot.
//!
//! Records are served from a [`MemoryMetadataStore`] and the full record set is
//! rewritten to disk after every mutation, so the store keeps the same expiry
//! behaviour and survives restarts.

use crate::snapshot::SnapshotFile;
use crate::{MemoryMetadataStore, MetadataStore};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tagvault_core::{MediaId, MediaMetadata, TagId};
use tagvault_error::{MediaResult, StorageError};
use tokio::task::JoinHandle;

/// File-backed metadata store.
///
/// Cloning is cheap and clones share records and file.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use tagvault_storage::FileMetadataStore;
///
/// # fn example() -> Result<(), tagvault_storage::StorageError> {
/// let store = FileMetadataStore::open("./data/state/metadata.json", Duration::from_secs(60))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileMetadataStore {
    records: MemoryMetadataStore,
    file: Arc<SnapshotFile>,
}

impl FileMetadataStore {
    /// Open the snapshot at `path`, or start empty if it does not exist yet.
    ///
    /// # Errors
    ///
    /// `FileRead` if the file exists but cannot be read or parsed.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(
        path: impl AsRef<Path>,
        incomplete_lifetime: Duration,
    ) -> Result<Self, StorageError> {
        let file = SnapshotFile::new(path.as_ref());
        let loaded: Vec<MediaMetadata> = file.load()?;
        tracing::info!(count = loaded.len(), "Loaded media metadata");

        Ok(Self {
            records: MemoryMetadataStore::from_records(incomplete_lifetime, loaded),
            file: Arc::new(file),
        })
    }

    /// Location of the snapshot.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Number of stored records, after expiry.
    pub async fn len(&self) -> usize {
        self.records.len().await
    }

    /// Whether the store holds no records, after expiry.
    pub async fn is_empty(&self) -> bool {
        self.records.is_empty().await
    }

    /// Run the expiry pass now, persist if anything went, and return the number
    /// of purged records.
    pub async fn purge_expired(&self) -> MediaResult<usize> {
        let purged = self.records.purge_expired().await;
        if purged > 0 {
            self.persist().await?;
        }
        Ok(purged)
    }

    /// Run the expiry pass every `interval` on the current runtime.
    pub fn spawn_expiry_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match store.purge_expired().await {
                    Ok(0) => {}
                    Ok(purged) => tracing::info!(purged, "Expired abandoned media metadata"),
                    Err(e) => tracing::warn!(error = %e, "Failed to persist expired metadata"),
                }
            }
        })
    }

    async fn persist(&self) -> MediaResult<()> {
        let _guard = self.file.lock().await;
        let records = self.records.snapshot().await;
        self.file.write(&records).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl MetadataStore for FileMetadataStore {
    async fn upsert(&self, record: &MediaMetadata) -> MediaResult<()> {
        self.records.upsert(record).await?;
        self.persist().await
    }

    async fn get(&self, id: &MediaId) -> MediaResult<MediaMetadata> {
        self.records.get(id).await
    }

    async fn set_upload_complete(&self, id: &MediaId, complete: bool) -> MediaResult<()> {
        self.records.set_upload_complete(id, complete).await?;
        self.persist().await
    }

    async fn find_by_tag_id(&self, tag_id: &TagId) -> MediaResult<Vec<MediaMetadata>> {
        self.records.find_by_tag_id(tag_id).await
    }

    async fn find_by_checksum(&self, checksum: &str) -> MediaResult<Option<MediaMetadata>> {
        self.records.find_by_checksum(checksum).await
    }

    async fn delete_all(&self, ids: &[MediaId]) -> MediaResult<()> {
        self.records.delete_all(ids).await?;
        self.persist().await
    }
}
