//! Test utilities for media service tests.
//!
//! Spy and failing store implementations wrapping the in-memory backends.

#![allow(dead_code)]

use std::collections::HashSet;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tagvault_core::{MediaId, MediaMetadata, MediaSource, Tag, TagId};
use tagvault_error::{MediaError, MediaErrorKind, MediaResult};
use tagvault_ingest::{MediaService, MediaServiceBuilder, MediaServiceConfigBuilder};
use tagvault_storage::{
    BlobStore, MemoryBlobStore, MemoryMetadataStore, MemoryTagStore, MetadataStore, TagStore,
};
use tokio::io::{AsyncRead, AsyncSeek, ReadBuf};
use tokio::sync::Barrier;

/// Incomplete metadata lifetime used by every test service.
pub const INCOMPLETE_LIFETIME: Duration = Duration::from_secs(60);

/// Tag store counting existence checks.
#[derive(Debug, Default)]
pub struct SpyTagStore {
    pub inner: MemoryTagStore,
    pub all_exist_calls: AtomicUsize,
}

#[async_trait::async_trait]
impl TagStore for SpyTagStore {
    async fn create_tag(&self, name: &str) -> MediaResult<TagId> {
        self.inner.create_tag(name).await
    }

    async fn list_tags(&self) -> MediaResult<Vec<Tag>> {
        self.inner.list_tags().await
    }

    async fn delete_tags(&self, ids: &[TagId]) -> MediaResult<()> {
        self.inner.delete_tags(ids).await
    }

    async fn all_exist(&self, ids: &[TagId]) -> MediaResult<bool> {
        self.all_exist_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.all_exist(ids).await
    }
}

/// Metadata store recording the name of every call.
///
/// With a checksum barrier, `find_by_checksum` answers only once the given
/// number of callers are all waiting in it.
#[derive(Debug)]
pub struct SpyMetadataStore {
    pub inner: MemoryMetadataStore,
    pub calls: Mutex<Vec<&'static str>>,
    pub checksum_barrier: Option<Barrier>,
}

impl SpyMetadataStore {
    pub fn new(inner: MemoryMetadataStore) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            checksum_barrier: None,
        }
    }

    pub fn with_checksum_barrier(inner: MemoryMetadataStore, parties: usize) -> Self {
        Self {
            checksum_barrier: Some(Barrier::new(parties)),
            ..Self::new(inner)
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl MetadataStore for SpyMetadataStore {
    async fn upsert(&self, record: &MediaMetadata) -> MediaResult<()> {
        self.record("upsert");
        self.inner.upsert(record).await
    }

    async fn get(&self, id: &MediaId) -> MediaResult<MediaMetadata> {
        self.record("get");
        self.inner.get(id).await
    }

    async fn set_upload_complete(&self, id: &MediaId, complete: bool) -> MediaResult<()> {
        self.record("set_upload_complete");
        self.inner.set_upload_complete(id, complete).await
    }

    async fn find_by_tag_id(&self, tag_id: &TagId) -> MediaResult<Vec<MediaMetadata>> {
        self.record("find_by_tag_id");
        self.inner.find_by_tag_id(tag_id).await
    }

    async fn find_by_checksum(&self, checksum: &str) -> MediaResult<Option<MediaMetadata>> {
        self.record("find_by_checksum");
        let found = self.inner.find_by_checksum(checksum).await;
        if let Some(barrier) = &self.checksum_barrier {
            barrier.wait().await;
        }
        found
    }

    async fn delete_all(&self, ids: &[MediaId]) -> MediaResult<()> {
        self.record("delete_all");
        self.inner.delete_all(ids).await
    }
}

/// How a [`ScriptedBlobStore`] misbehaves.
#[derive(Debug, Clone, Default)]
pub enum BlobBehavior {
    /// Delegate to the in-memory store.
    #[default]
    Normal,
    /// Every put fails with an upstream error.
    FailPut,
    /// Every put never completes.
    HangPut,
    /// Presigning fails for the listed keys.
    FailPresign(HashSet<String>),
    /// Put deletes the metadata record of the same key before succeeding.
    DeleteMetadataOnPut(MemoryMetadataStore),
}

/// Blob store with scripted failures.
#[derive(Debug, Default)]
pub struct ScriptedBlobStore {
    pub inner: MemoryBlobStore,
    pub behavior: BlobBehavior,
}

impl ScriptedBlobStore {
    pub fn new(behavior: BlobBehavior) -> Self {
        Self {
            inner: MemoryBlobStore::new(),
            behavior,
        }
    }
}

#[async_trait::async_trait]
impl BlobStore for ScriptedBlobStore {
    async fn put(&self, key: &str, source: &mut dyn MediaSource) -> MediaResult<()> {
        match &self.behavior {
            BlobBehavior::FailPut => Err(MediaError::new(MediaErrorKind::UpstreamCommunication {
                upstream: "blob store".to_string(),
                message: "connection reset".to_string(),
            })),
            BlobBehavior::HangPut => std::future::pending().await,
            BlobBehavior::DeleteMetadataOnPut(metadata) => {
                metadata.delete_all(&[MediaId::from(key)]).await?;
                self.inner.put(key, source).await
            }
            _ => self.inner.put(key, source).await,
        }
    }

    async fn presign_get(&self, key: &str, lifetime: Duration) -> MediaResult<String> {
        if let BlobBehavior::FailPresign(keys) = &self.behavior {
            if keys.contains(key) {
                return Err(MediaError::new(MediaErrorKind::UpstreamUnavailable(
                    "presigner offline".to_string(),
                )));
            }
        }
        Ok(format!("https://blobs.test/{}?ttl={}", key, lifetime.as_secs()))
    }

    async fn delete_all(&self, keys: &[String]) -> MediaResult<()> {
        self.inner.delete_all(keys).await
    }
}

/// A source whose reads always fail.
pub struct BrokenSource;

impl AsyncRead for BrokenSource {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Poll::Ready(Err(std::io::Error::other("disk on fire")))
    }
}

impl AsyncSeek for BrokenSource {
    fn start_seek(self: Pin<&mut Self>, _position: std::io::SeekFrom) -> std::io::Result<()> {
        Ok(())
    }

    fn poll_complete(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<u64>> {
        Poll::Ready(Ok(0))
    }
}

/// Service wired to spies, plus handles to inspect them.
pub struct Harness {
    pub service: MediaService,
    pub tags: Arc<SpyTagStore>,
    pub metadata: Arc<SpyMetadataStore>,
    pub blobs: Arc<ScriptedBlobStore>,
}

impl Harness {
    /// Harness over a metadata store expiring pending records after [`INCOMPLETE_LIFETIME`].
    pub fn new(behavior: BlobBehavior) -> Self {
        Self::with_metadata(MemoryMetadataStore::new(INCOMPLETE_LIFETIME), behavior)
    }

    pub fn with_metadata(metadata: MemoryMetadataStore, behavior: BlobBehavior) -> Self {
        Self::with_spy(SpyMetadataStore::new(metadata), behavior)
    }

    /// Harness whose checksum lookups hold until `parties` uploads reached them.
    pub fn with_checksum_barrier(parties: usize) -> Self {
        Self::with_spy(
            SpyMetadataStore::with_checksum_barrier(
                MemoryMetadataStore::new(INCOMPLETE_LIFETIME),
                parties,
            ),
            BlobBehavior::Normal,
        )
    }

    fn with_spy(metadata: SpyMetadataStore, behavior: BlobBehavior) -> Self {
        let tags = Arc::new(SpyTagStore::default());
        let metadata = Arc::new(metadata);
        let blobs = Arc::new(ScriptedBlobStore::new(behavior));

        let config = MediaServiceConfigBuilder::default()
            .incomplete_metadata_lifetime(INCOMPLETE_LIFETIME)
            .media_url_lifetime(Duration::from_secs(900))
            .build()
            .unwrap();

        let service = MediaServiceBuilder::default()
            .tags(tags.clone())
            .metadata(metadata.clone())
            .blobs(blobs.clone())
            .config(config)
            .span(tracing::info_span!("test"))
            .build()
            .unwrap();

        Self {
            service,
            tags,
            metadata,
            blobs,
        }
    }

    pub async fn tag(&self, name: &str) -> TagId {
        self.tags.inner.create_tag(name).await.unwrap()
    }
}
