//! In-memory metadata store with passive expiry.
//!
//! Records live in a `HashMap` behind an `RwLock`. Pending records older than the
//! configured lifetime are purged by the store itself: at the start of every
//! operation, and periodically once [`MemoryMetadataStore::spawn_expiry_sweeper`]
//! has been started.

use crate::MetadataStore;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tagvault_core::{MediaId, MediaMetadata, TagId, is_stale};
use tagvault_error::{MediaError, MediaErrorKind, MediaResult};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// In-memory metadata store.
///
/// Cloning is cheap and clones share the same records.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use tagvault_storage::MemoryMetadataStore;
///
/// #[tokio::main]
/// async fn main() {
///     let store = MemoryMetadataStore::new(Duration::from_secs(60));
///     assert!(store.is_empty().await);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryMetadataStore {
    /// Records keyed by media id
    records: Arc<RwLock<HashMap<MediaId, MediaMetadata>>>,
    /// Lifetime of pending records; `None` disables expiry
    incomplete_lifetime: Option<Duration>,
}

impl MemoryMetadataStore {
    /// Create an empty store expiring pending records after `incomplete_lifetime`.
    pub fn new(incomplete_lifetime: Duration) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            incomplete_lifetime: Some(incomplete_lifetime),
        }
    }

    /// Create an empty store that never expires anything.
    pub fn without_expiry() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            incomplete_lifetime: None,
        }
    }

    /// Create a store seeded with `records`, expiring pending ones after
    /// `incomplete_lifetime`. Stale records are dropped on first access.
    pub fn from_records(
        incomplete_lifetime: Duration,
        records: impl IntoIterator<Item = MediaMetadata>,
    ) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.id().clone(), record))
            .collect();
        Self {
            records: Arc::new(RwLock::new(records)),
            incomplete_lifetime: Some(incomplete_lifetime),
        }
    }

    /// All live records, ordered by id.
    pub async fn snapshot(&self) -> Vec<MediaMetadata> {
        let mut records = self.records.write().await;
        self.purge(&mut records, Utc::now());
        let mut all: Vec<MediaMetadata> = records.values().cloned().collect();
        all.sort_by(|a, b| a.id().cmp(b.id()));
        all
    }

    /// Number of stored records, after expiry.
    pub async fn len(&self) -> usize {
        let mut records = self.records.write().await;
        self.purge(&mut records, Utc::now());
        records.len()
    }

    /// Whether the store holds no records, after expiry.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Run the expiry pass now and return the number of purged records.
    pub async fn purge_expired(&self) -> usize {
        let mut records = self.records.write().await;
        self.purge(&mut records, Utc::now())
    }

    /// Run the expiry pass every `interval` on the current runtime.
    ///
    /// The task holds a clone of the store and runs until aborted.
    pub fn spawn_expiry_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let purged = store.purge_expired().await;
                if purged > 0 {
                    tracing::info!(purged, "Expired abandoned media metadata");
                }
            }
        })
    }

    fn purge(&self, records: &mut HashMap<MediaId, MediaMetadata>, now: DateTime<Utc>) -> usize {
        let Some(lifetime) = self.incomplete_lifetime else {
            return 0;
        };

        let before = records.len();
        records.retain(|_, record| !is_stale(record, now, lifetime));
        let purged = before - records.len();

        if purged > 0 {
            tracing::debug!(purged, "Purged stale pending records");
        }
        purged
    }
}

impl Default for MemoryMetadataStore {
    fn default() -> Self {
        Self::without_expiry()
    }
}

#[async_trait::async_trait]
impl MetadataStore for MemoryMetadataStore {
    #[tracing::instrument(skip(self, record), fields(id = %record.id(), complete = record.upload_complete()))]
    async fn upsert(&self, record: &MediaMetadata) -> MediaResult<()> {
        let mut records = self.records.write().await;
        self.purge(&mut records, Utc::now());
        records.insert(record.id().clone(), record.clone());
        tracing::debug!("Upserted media metadata");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn get(&self, id: &MediaId) -> MediaResult<MediaMetadata> {
        let mut records = self.records.write().await;
        self.purge(&mut records, Utc::now());
        records.get(id).cloned().ok_or_else(|| {
            MediaError::new(MediaErrorKind::ResourceNotFound(format!(
                "media metadata {}",
                id
            )))
        })
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn set_upload_complete(&self, id: &MediaId, complete: bool) -> MediaResult<()> {
        let now = Utc::now();
        let mut records = self.records.write().await;
        self.purge(&mut records, now);

        let record = records.get_mut(id).ok_or_else(|| {
            MediaError::new(MediaErrorKind::ResourceNotFound(format!(
                "media metadata {}",
                id
            )))
        })?;
        record.set_upload_complete(complete, now);
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(tag_id = %tag_id))]
    async fn find_by_tag_id(&self, tag_id: &TagId) -> MediaResult<Vec<MediaMetadata>> {
        let mut records = self.records.write().await;
        self.purge(&mut records, Utc::now());

        let mut found: Vec<MediaMetadata> = records
            .values()
            .filter(|record| record.tag_ids().contains(tag_id))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id().cmp(b.id())));

        tracing::debug!(count = found.len(), "Found media metadata by tag");
        Ok(found)
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_checksum(&self, checksum: &str) -> MediaResult<Option<MediaMetadata>> {
        let mut records = self.records.write().await;
        self.purge(&mut records, Utc::now());

        let matches: Vec<&MediaMetadata> = records
            .values()
            .filter(|record| record.checksum() == checksum)
            .collect();

        if matches.len() > 1 {
            tracing::warn!(
                count = matches.len(),
                "Found multiple records with the same checksum, preferring a complete one"
            );
        }

        let chosen = matches
            .iter()
            .find(|record| record.upload_complete())
            .or_else(|| matches.first())
            .map(|record| (*record).clone());
        Ok(chosen)
    }

    #[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete_all(&self, ids: &[MediaId]) -> MediaResult<()> {
        let mut records = self.records.write().await;
        for id in ids {
            records.remove(id);
        }
        Ok(())
    }
}
