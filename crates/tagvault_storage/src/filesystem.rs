//! Filesystem blob store.
//!
//! Blobs are stored content-addressed under their key (the media id, itself a
//! SHA-256 hex digest), spread over two levels of subdirectories.

use crate::{BlobStore, UrlSigner};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tagvault_core::MediaSource;
use tagvault_error::{MediaResult, StorageError, StorageErrorKind};
use uuid::Uuid;

/// Shortest key accepted, so both subdirectory levels exist.
const MIN_KEY_LEN: usize = 4;

/// Filesystem blob backend.
///
/// Layout: `{base_path}/{key[0:2]}/{key[2:4]}/{key}`
///
/// ```text
/// /var/lib/tagvault/blobs/
/// ├── ab/
/// │   └── cd/
/// │       └── abcdef123456...
/// └── 12/
///     └── 34/
///         └── 123456abcdef...
/// ```
///
/// Writes go to a uniquely named temp file next to the target and are renamed
/// into place, so readers never observe a partial blob and two writers of the
/// same key do not interleave.
#[derive(Debug, Clone)]
pub struct FileSystemBlobStore {
    base_path: PathBuf,
    signer: UrlSigner,
}

impl FileSystemBlobStore {
    /// Create a blob store rooted at `base_path`, issuing URLs through `signer`.
    ///
    /// Creates the base directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    #[tracing::instrument(skip(base_path, signer))]
    pub fn new(base_path: impl Into<PathBuf>, signer: UrlSigner) -> Result<Self, StorageError> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        tracing::info!(path = %base_path.display(), "Created filesystem blob store");
        Ok(Self { base_path, signer })
    }

    /// Root directory of the store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// The signer used for presigned URLs.
    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    /// Keys must be lowercase hex, which also keeps them free of path separators.
    fn validate_key(key: &str) -> Result<(), StorageError> {
        let well_formed = key.len() >= MIN_KEY_LEN
            && key
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        if well_formed {
            Ok(())
        } else {
            Err(StorageError::new(StorageErrorKind::InvalidKey(
                key.to_string(),
            )))
        }
    }

    /// Path of the blob stored under `key`.
    fn get_path(&self, key: &str) -> PathBuf {
        self.base_path
            .join(&key[0..2])
            .join(&key[2..4])
            .join(key)
    }

    /// Open the blob at `key` after checking a presented URL signature.
    ///
    /// # Errors
    ///
    /// `InvalidKey` for a malformed key, `SignatureRejected` for an expired or
    /// forged URL, `NotFound` if no blob exists under `key`.
    #[tracing::instrument(skip(self, signature))]
    pub async fn open_signed(
        &self,
        key: &str,
        expires: i64,
        signature: &str,
    ) -> Result<tokio::fs::File, StorageError> {
        Self::validate_key(key)?;
        self.signer.verify(key, expires, signature, Utc::now())?;
        self.open(key).await
    }

    /// Open the blob at `key` for reading.
    pub async fn open(&self, key: &str) -> Result<tokio::fs::File, StorageError> {
        Self::validate_key(key)?;
        let path = self.get_path(key);

        tokio::fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(key.to_string()))
            } else {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        })
    }

    async fn write(&self, key: &str, source: &mut dyn MediaSource) -> Result<u64, StorageError> {
        Self::validate_key(key)?;
        let path = self.get_path(key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let temp_path = path.with_file_name(format!("{}.{}.tmp", key, Uuid::new_v4()));
        let written = match Self::copy_into(&temp_path, source).await {
            Ok(written) => written,
            Err(e) => {
                let _ = tokio::fs::remove_file(&temp_path).await;
                return Err(e);
            }
        };

        tokio::fs::rename(&temp_path, &path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
        })?;

        Ok(written)
    }

    async fn copy_into(temp_path: &Path, source: &mut dyn MediaSource) -> Result<u64, StorageError> {
        let write_error = |e: std::io::Error| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        };

        let mut file = tokio::fs::File::create(temp_path)
            .await
            .map_err(write_error)?;
        let written = tokio::io::copy(source, &mut file)
            .await
            .map_err(write_error)?;
        file.sync_all().await.map_err(write_error)?;
        Ok(written)
    }
}

#[async_trait::async_trait]
impl BlobStore for FileSystemBlobStore {
    #[tracing::instrument(skip(self, source))]
    async fn put(&self, key: &str, source: &mut dyn MediaSource) -> MediaResult<()> {
        let size = self.write(key, source).await?;
        tracing::info!(size, "Stored blob");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn presign_get(&self, key: &str, lifetime: Duration) -> MediaResult<String> {
        Self::validate_key(key)?;
        let path = self.get_path(key);
        match tokio::fs::try_exists(&path).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(StorageError::new(StorageErrorKind::NotFound(key.to_string())).into());
            }
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
                .into());
            }
        }

        let lifetime = chrono::Duration::from_std(lifetime).map_err(|e| {
            StorageError::new(StorageErrorKind::Unavailable(format!(
                "url lifetime out of range: {}",
                e
            )))
        })?;
        Ok(self.signer.sign(key, Utc::now() + lifetime)?)
    }

    #[tracing::instrument(skip(self, keys), fields(count = keys.len()))]
    async fn delete_all(&self, keys: &[String]) -> MediaResult<()> {
        for key in keys {
            Self::validate_key(key)?;
            let path = self.get_path(key);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => tracing::debug!(key = %key, "Deleted blob"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(StorageError::new(StorageErrorKind::FileWrite(format!(
                        "delete {}: {}",
                        path.display(),
                        e
                    )))
                    .into());
                }
            }
        }
        Ok(())
    }
}
