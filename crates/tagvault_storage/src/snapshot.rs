//! Atomic JSON snapshot files.
//!
//! A snapshot is a versioned envelope around a list of entries:
//!
//! ```json
//! { "schema_version": 1, "entries": [ ... ] }
//! ```
//!
//! Every write replaces the whole file through a temp file and a rename, so a
//! crash leaves either the previous or the new snapshot on disk.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tagvault_error::{StorageError, StorageErrorKind};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Current snapshot layout.
pub(crate) const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    schema_version: u32,
    entries: &'a [T],
}

#[derive(Deserialize)]
struct Envelope<T> {
    schema_version: u32,
    entries: Vec<T>,
}

/// One snapshot file on disk.
#[derive(Debug)]
pub(crate) struct SnapshotFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SnapshotFile {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Read all entries. A missing file is an empty snapshot.
    pub(crate) fn load<T: DeserializeOwned>(&self) -> Result<Vec<T>, StorageError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No snapshot yet, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.read_error(e)),
        };

        let envelope: Envelope<T> = serde_json::from_slice(&bytes).map_err(|e| self.read_error(e))?;
        if envelope.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(self.read_error(format!(
                "unsupported schema version {}",
                envelope.schema_version
            )));
        }
        Ok(envelope.entries)
    }

    /// Serialise writers. Hold the guard while reading the state to write, so the
    /// last write always carries the newest state.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// Replace the snapshot with `entries`.
    pub(crate) async fn write<T: Serialize>(&self, entries: &[T]) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(&EnvelopeRef {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            entries,
        })
        .map_err(|e| self.write_error(&self.path, e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot".to_string());
        let temp_path = self
            .path
            .with_file_name(format!("{}.{}.tmp", file_name, Uuid::new_v4()));

        if let Err(e) = self.write_temp(&temp_path, &bytes).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| self.write_error(&temp_path, e))?;

        tracing::debug!(path = %self.path.display(), count = entries.len(), "Wrote snapshot");
        Ok(())
    }

    async fn write_temp(&self, temp_path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        let mut file = tokio::fs::File::create(temp_path)
            .await
            .map_err(|e| self.write_error(temp_path, e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| self.write_error(temp_path, e))?;
        file.sync_all()
            .await
            .map_err(|e| self.write_error(temp_path, e))
    }

    #[track_caller]
    fn read_error(&self, e: impl std::fmt::Display) -> StorageError {
        StorageError::new(StorageErrorKind::FileRead(format!(
            "snapshot {}: {}",
            self.path.display(),
            e
        )))
    }

    #[track_caller]
    fn write_error(&self, path: &Path, e: impl std::fmt::Display) -> StorageError {
        StorageError::new(StorageErrorKind::FileWrite(format!(
            "snapshot {}: {}",
            path.display(),
            e
        )))
    }
}
