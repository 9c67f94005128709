//! Media ingestion and retrieval.

use crate::{CallContext, MediaServiceConfig};
use chrono::Utc;
use std::sync::Arc;
use tagvault_core::{
    DedupDecision, MediaId, MediaItem, MediaMetadata, MediaSource, TagId, canonical_tag_ids,
    decide, derive_identity,
};
use tagvault_error::{MediaError, MediaErrorKind, MediaResult};
use tagvault_storage::{BlobStore, MetadataStore, TagStore};
use tracing::Instrument;

/// Orchestrates uploads and assembles retrieval results over the three stores.
///
/// Holds no mutable state of its own. Concurrent identical uploads converge
/// through the metadata store's atomic upsert, so the service is safe to share
/// between any number of request handlers.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tagvault_ingest::{CallContext, MediaServiceBuilder};
/// use tagvault_storage::{MemoryBlobStore, MemoryMetadataStore, MemoryTagStore, TagStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let tags = MemoryTagStore::new();
///     let holiday = tags.create_tag("holiday").await?;
///
///     let service = MediaServiceBuilder::default()
///         .tags(Arc::new(tags))
///         .metadata(Arc::new(MemoryMetadataStore::new(Duration::from_secs(60))))
///         .blobs(Arc::new(MemoryBlobStore::new()))
///         .build()?;
///
///     let ctx = CallContext::new();
///     let id = service
///         .create_media(&ctx, "beach", vec![holiday.clone()], &mut Cursor::new(b"ABC".to_vec()))
///         .await?;
///
///     let items = service.find_by_tag(&ctx, &holiday).await?;
///     assert_eq!(items[0].metadata().id(), &id);
///     Ok(())
/// }
/// ```
#[derive(derive_builder::Builder)]
#[builder(pattern = "owned", build_fn(private, name = "build_internal"))]
pub struct MediaService {
    /// Tag vocabulary uploads are validated against.
    tags: Arc<dyn TagStore>,
    /// Metadata records.
    metadata: Arc<dyn MetadataStore>,
    /// Uploaded content, keyed by media id.
    blobs: Arc<dyn BlobStore>,
    /// Lifetimes.
    #[builder(default)]
    config: MediaServiceConfig,
    /// Parent of every span the service opens.
    #[builder(default = "tracing::Span::current()")]
    span: tracing::Span,
}

impl MediaServiceBuilder {
    /// Build the service.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if a store was not supplied.
    pub fn build(self) -> MediaResult<MediaService> {
        self.build_internal().map_err(|e| {
            MediaError::new(MediaErrorKind::IllegalState(format!(
                "incomplete media service: {}",
                e
            )))
        })
    }
}

impl MediaService {
    /// Lifetimes in use.
    pub fn config(&self) -> &MediaServiceConfig {
        &self.config
    }

    /// Ingest an upload and return its media id.
    ///
    /// Tag ids are canonicalised (sorted, deduplicated) before anything else, so
    /// submission order never affects the id. `source` is read from its start.
    ///
    /// Sequence: validate tags, derive identity, consult the dedup decision for
    /// any record sharing the checksum, upsert the pending record, write the
    /// blob, mark the record complete.
    ///
    /// # Errors
    ///
    /// - `BadUserInput` for an empty name or unknown tag ids, before the content
    ///   is read or any store written
    /// - `ResourceAlreadyExists` when the content is stored under other labels,
    ///   or another upload of it is still in flight
    /// - `InputOutput` when the stream cannot be read
    /// - `IllegalState` when the pending record vanished before completion
    /// - `Timeout` / `Cancelled` from `ctx`
    /// - store errors, unchanged
    ///
    /// A failure after the pending record was written leaves it pending. It is
    /// never rolled back; passive expiry reclaims it.
    pub async fn create_media(
        &self,
        ctx: &CallContext,
        name: &str,
        tag_ids: Vec<TagId>,
        source: &mut dyn MediaSource,
    ) -> MediaResult<MediaId> {
        let span = tracing::info_span!(
            parent: &self.span,
            "create_media",
            request_id = %ctx.request_id(),
            name = %name,
            media_id = tracing::field::Empty,
        );

        self.ingest(ctx, name, tag_ids, source)
            .instrument(span)
            .await
    }

    async fn ingest(
        &self,
        ctx: &CallContext,
        name: &str,
        tag_ids: Vec<TagId>,
        source: &mut dyn MediaSource,
    ) -> MediaResult<MediaId> {
        if name.trim().is_empty() {
            return Err(MediaError::new(MediaErrorKind::BadUserInput(
                "media name is required".to_string(),
            )));
        }

        let tag_ids = canonical_tag_ids(tag_ids);
        if !ctx.run("check tags", self.tags.all_exist(&tag_ids)).await? {
            return Err(MediaError::new(MediaErrorKind::BadUserInput(
                "not all tag ids exist. Add them first.".to_string(),
            )));
        }

        let identity = ctx
            .run("hash upload", derive_identity(source, name, &tag_ids))
            .await?;
        tracing::Span::current().record("media_id", tracing::field::display(&identity.media_id));

        let now = Utc::now();
        let candidate = MediaMetadata::pending(identity, name, tag_ids, now);

        let existing = ctx
            .run(
                "find by checksum",
                self.metadata.find_by_checksum(candidate.checksum()),
            )
            .await?;

        let decision = decide(
            &candidate,
            existing.as_ref(),
            now,
            *self.config.incomplete_metadata_lifetime(),
        );
        match decision {
            DedupDecision::Proceed => {}
            DedupDecision::ProceedOverwrite(stale_id) => {
                tracing::info!(stale_id = %stale_id, "Reclaiming abandoned upload");
            }
            DedupDecision::ReuseExisting(existing_id) => {
                tracing::info!(existing_id = %existing_id, "Media already stored, reusing");
                return Ok(existing_id);
            }
            DedupDecision::RejectConflict {
                existing_id,
                reason,
            } => {
                tracing::info!(existing_id = %existing_id, reason = %reason, "Rejecting conflicting upload");
                return Err(reason.to_error(&existing_id));
            }
        }

        let id = candidate.id().clone();

        ctx.run("store pending metadata", self.metadata.upsert(&candidate))
            .await?;

        ctx.run("store blob", self.blobs.put(id.as_str(), source))
            .await?;

        ctx.run(
            "mark upload complete",
            self.metadata.set_upload_complete(&id, true),
        )
        .await
        .map_err(|e| {
            if e.is_not_found() {
                tracing::error!(error = %e, "Pending metadata vanished before completion");
                MediaError::new(MediaErrorKind::IllegalState(format!(
                    "metadata {} disappeared while uploading: {}",
                    id, e
                )))
            } else {
                e
            }
        })?;

        tracing::info!("Stored media");
        Ok(id)
    }

    /// All media carrying `tag_id`, each with a presigned URL where one could be
    /// obtained.
    ///
    /// Presigning is best effort: an item whose URL cannot be generated is
    /// returned without one and the failure is logged.
    ///
    /// # Errors
    ///
    /// Metadata store errors, and `Timeout` / `Cancelled` from `ctx`.
    pub async fn find_by_tag(
        &self,
        ctx: &CallContext,
        tag_id: &TagId,
    ) -> MediaResult<Vec<MediaItem>> {
        let span = tracing::info_span!(
            parent: &self.span,
            "find_by_tag",
            request_id = %ctx.request_id(),
            tag_id = %tag_id,
        );

        self.assemble(ctx, tag_id).instrument(span).await
    }

    async fn assemble(&self, ctx: &CallContext, tag_id: &TagId) -> MediaResult<Vec<MediaItem>> {
        let records = ctx
            .run("find by tag", self.metadata.find_by_tag_id(tag_id))
            .await?;

        let mut items = Vec::with_capacity(records.len());
        for record in records {
            let presigned = ctx
                .run(
                    "presign media url",
                    self.blobs
                        .presign_get(record.id().as_str(), *self.config.media_url_lifetime()),
                )
                .await;

            let file_url = match presigned {
                Ok(url) => Some(url),
                Err(e) if is_call_aborted(&e) => return Err(e),
                Err(e) => {
                    tracing::warn!(media_id = %record.id(), error = %e, "Failed to presign media URL, returning item without it");
                    None
                }
            };
            items.push(MediaItem::new(record, file_url));
        }

        tracing::debug!(count = items.len(), "Assembled media items");
        Ok(items)
    }
}

fn is_call_aborted(err: &MediaError) -> bool {
    matches!(
        err.kind(),
        MediaErrorKind::Timeout(_) | MediaErrorKind::Cancelled(_)
    )
}
