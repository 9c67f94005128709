//! Tag vocabulary persisted to a JSON snapshot.

use crate::snapshot::SnapshotFile;
use crate::{MemoryTagStore, TagStore};
use std::path::Path;
use std::sync::Arc;
use tagvault_core::{Tag, TagId};
use tagvault_error::{MediaResult, StorageError};

/// File-backed tag store.
///
/// Cloning is cheap and clones share vocabulary and file.
#[derive(Debug, Clone)]
pub struct FileTagStore {
    tags: MemoryTagStore,
    file: Arc<SnapshotFile>,
}

impl FileTagStore {
    /// Open the snapshot at `path`, or start empty if it does not exist yet.
    ///
    /// # Errors
    ///
    /// `FileRead` if the file exists but cannot be read or parsed.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let file = SnapshotFile::new(path.as_ref());
        let loaded: Vec<Tag> = file.load()?;
        tracing::info!(count = loaded.len(), "Loaded tags");

        Ok(Self {
            tags: MemoryTagStore::from_tags(loaded),
            file: Arc::new(file),
        })
    }

    /// Location of the snapshot.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    async fn persist(&self) -> MediaResult<()> {
        let _guard = self.file.lock().await;
        let tags = self.tags.list_tags().await?;
        self.file.write(&tags).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TagStore for FileTagStore {
    async fn create_tag(&self, name: &str) -> MediaResult<TagId> {
        let id = self.tags.create_tag(name).await?;
        self.persist().await?;
        Ok(id)
    }

    async fn list_tags(&self) -> MediaResult<Vec<Tag>> {
        self.tags.list_tags().await
    }

    async fn delete_tags(&self, ids: &[TagId]) -> MediaResult<()> {
        self.tags.delete_tags(ids).await?;
        self.persist().await
    }

    async fn all_exist(&self, ids: &[TagId]) -> MediaResult<bool> {
        self.tags.all_exist(ids).await
    }
}
