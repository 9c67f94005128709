//! Tests for media ingestion.

mod test_utils;

use chrono::{Duration as ChronoDuration, Utc};
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tagvault_core::{MediaMetadataBuilder, TagId};
use tagvault_error::MediaErrorKind;
use tagvault_ingest::CallContext;
use tagvault_storage::{MemoryMetadataStore, MetadataStore};
use test_utils::{BlobBehavior, BrokenSource, Harness};

fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

fn source(bytes: &[u8]) -> Cursor<Vec<u8>> {
    Cursor::new(bytes.to_vec())
}

#[tokio::test]
async fn test_upload_returns_content_derived_id() {
    let harness = Harness::new(BlobBehavior::Normal);
    let t1 = harness.tag("t1").await;

    let id = harness
        .service
        .create_media(&CallContext::new(), "pic1", vec![t1.clone()], &mut source(b"ABC"))
        .await
        .unwrap();

    let checksum = sha256_hex(b"ABC");
    let expected = sha256_hex(format!("pic1{}{}", t1, checksum).as_bytes());
    assert_eq!(id.as_str(), expected);

    let stored = harness.metadata.inner.get(&id).await.unwrap();
    assert!(stored.upload_complete());
    assert_eq!(stored.checksum(), &checksum);
    assert_eq!(harness.blobs.inner.get(id.as_str()).await.unwrap(), b"ABC");
}

#[tokio::test]
async fn test_reupload_is_idempotent_and_renamed_reupload_conflicts() {
    let harness = Harness::new(BlobBehavior::Normal);
    let t1 = harness.tag("t1").await;
    let ctx = CallContext::new();

    let x = harness
        .service
        .create_media(&ctx, "pic1", vec![t1.clone()], &mut source(b"ABC"))
        .await
        .unwrap();

    let again = harness
        .service
        .create_media(&ctx, "pic1", vec![t1.clone()], &mut source(b"ABC"))
        .await
        .unwrap();
    assert_eq!(again, x);
    assert_eq!(harness.blobs.inner.put_count(), 1, "no second blob write");

    let err = harness
        .service
        .create_media(&ctx, "pic2", vec![t1], &mut source(b"ABC"))
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), MediaErrorKind::ResourceAlreadyExists { .. }));
    assert_eq!(err.existing_id(), Some(x.as_str()));
    assert!(!err.is_retryable());
    assert_eq!(harness.blobs.inner.put_count(), 1);
}

#[tokio::test]
async fn test_same_content_with_other_tags_conflicts() {
    let harness = Harness::new(BlobBehavior::Normal);
    let t1 = harness.tag("t1").await;
    let t2 = harness.tag("t2").await;
    let ctx = CallContext::new();

    let x = harness
        .service
        .create_media(&ctx, "pic1", vec![t1.clone()], &mut source(b"ABC"))
        .await
        .unwrap();

    let err = harness
        .service
        .create_media(&ctx, "pic1", vec![t1, t2], &mut source(b"ABC"))
        .await
        .unwrap_err();
    assert_eq!(err.existing_id(), Some(x.as_str()));
}

#[tokio::test]
async fn test_tag_order_does_not_change_identity() {
    let harness = Harness::new(BlobBehavior::Normal);
    let t1 = harness.tag("t1").await;
    let t2 = harness.tag("t2").await;
    let ctx = CallContext::new();

    let first = harness
        .service
        .create_media(&ctx, "pic1", vec![t2.clone(), t1.clone()], &mut source(b"ABC"))
        .await
        .unwrap();
    let second = harness
        .service
        .create_media(&ctx, "pic1", vec![t1.clone(), t2.clone(), t1.clone()], &mut source(b"ABC"))
        .await
        .unwrap();

    assert_eq!(first, second);
    let stored = harness.metadata.inner.get(&first).await.unwrap();
    let mut sorted = vec![t1, t2];
    sorted.sort();
    assert_eq!(stored.tag_ids(), &sorted);
}

#[tokio::test]
async fn test_unknown_tag_fails_before_any_store_access() {
    let harness = Harness::new(BlobBehavior::Normal);
    let t1 = harness.tag("t1").await;
    let mut upload = source(b"ABC");

    let err = harness
        .service
        .create_media(
            &CallContext::new(),
            "pic1",
            vec![t1, TagId::from("missing")],
            &mut upload,
        )
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), MediaErrorKind::BadUserInput(_)));
    assert_eq!(harness.tags.all_exist_calls.load(Ordering::SeqCst), 1);
    assert!(harness.metadata.calls().is_empty());
    assert_eq!(harness.blobs.inner.put_count(), 0);
    assert_eq!(upload.position(), 0, "content never read");
}

#[tokio::test]
async fn test_empty_name_is_rejected() {
    let harness = Harness::new(BlobBehavior::Normal);

    let err = harness
        .service
        .create_media(&CallContext::new(), "  ", vec![], &mut source(b"ABC"))
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), MediaErrorKind::BadUserInput(_)));
    assert_eq!(harness.tags.all_exist_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_active_pending_upload_blocks_same_content() {
    let harness = Harness::new(BlobBehavior::Normal);
    let pending = MediaMetadataBuilder::default()
        .id("in-flight")
        .name("pic1")
        .checksum(sha256_hex(b"ABC"))
        .last_update(Utc::now() - ChronoDuration::seconds(10))
        .build()
        .unwrap();
    harness.metadata.inner.upsert(&pending).await.unwrap();

    let err = harness
        .service
        .create_media(&CallContext::new(), "pic1", vec![], &mut source(b"ABC"))
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), MediaErrorKind::ResourceAlreadyExists { .. }));
    assert_eq!(err.existing_id(), Some("in-flight"));
    assert_eq!(harness.blobs.inner.put_count(), 0);
}

#[tokio::test]
async fn test_stale_pending_upload_is_reclaimed() {
    // A store that has not purged yet, so the stale record is still visible
    let harness = Harness::with_metadata(MemoryMetadataStore::without_expiry(), BlobBehavior::Normal);
    let stale = MediaMetadataBuilder::default()
        .id("abandoned")
        .name("pic1")
        .checksum(sha256_hex(b"ABC"))
        .last_update(Utc::now() - ChronoDuration::seconds(120))
        .build()
        .unwrap();
    harness.metadata.inner.upsert(&stale).await.unwrap();

    let id = harness
        .service
        .create_media(&CallContext::new(), "pic1", vec![], &mut source(b"ABC"))
        .await
        .unwrap();

    let stored = harness.metadata.inner.get(&id).await.unwrap();
    assert!(stored.upload_complete());
    assert_eq!(harness.blobs.inner.put_count(), 1);
}

#[tokio::test]
async fn test_blob_failure_leaves_record_pending() {
    let harness = Harness::new(BlobBehavior::FailPut);
    let ctx = CallContext::new();

    let err = harness
        .service
        .create_media(&ctx, "pic1", vec![], &mut source(b"ABC"))
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), MediaErrorKind::UpstreamCommunication { .. }));
    assert!(err.is_retryable());

    let pending = harness
        .metadata
        .inner
        .find_by_checksum(&sha256_hex(b"ABC"))
        .await
        .unwrap()
        .unwrap();
    assert!(!pending.upload_complete());
    assert_eq!(
        harness.metadata.calls(),
        vec!["find_by_checksum", "upsert"],
        "no compensating delete"
    );

    // Until it goes stale, the abandoned record blocks a retry
    let err = harness
        .service
        .create_media(&ctx, "pic1", vec![], &mut source(b"ABC"))
        .await
        .unwrap_err();
    assert_eq!(err.existing_id(), Some(pending.id().as_str()));
}

#[tokio::test]
async fn test_unreadable_upload_is_an_io_error_without_writes() {
    let harness = Harness::new(BlobBehavior::Normal);

    let err = harness
        .service
        .create_media(&CallContext::new(), "pic1", vec![], &mut BrokenSource)
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), MediaErrorKind::InputOutput(_)));
    assert!(harness.metadata.calls().is_empty());
}

#[tokio::test]
async fn test_vanished_record_is_an_illegal_state() {
    let metadata = MemoryMetadataStore::new(test_utils::INCOMPLETE_LIFETIME);
    let harness = Harness::with_metadata(
        metadata.clone(),
        BlobBehavior::DeleteMetadataOnPut(metadata),
    );

    let err = harness
        .service
        .create_media(&CallContext::new(), "pic1", vec![], &mut source(b"ABC"))
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), MediaErrorKind::IllegalState(_)));
}

#[tokio::test(start_paused = true)]
async fn test_deadline_aborts_hanging_blob_write() {
    let harness = Harness::new(BlobBehavior::HangPut);
    let ctx = CallContext::new().with_timeout(Duration::from_secs(5));

    let err = harness
        .service
        .create_media(&ctx, "pic1", vec![], &mut source(b"ABC"))
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), MediaErrorKind::Timeout(_)));
    let pending = harness
        .metadata
        .inner
        .find_by_checksum(&sha256_hex(b"ABC"))
        .await
        .unwrap()
        .unwrap();
    assert!(!pending.upload_complete(), "left for passive expiry");
}

#[tokio::test]
async fn test_cancelled_context_touches_nothing() {
    let harness = Harness::new(BlobBehavior::Normal);
    let (ctx, handle) = CallContext::cancellable();
    handle.cancel();

    let err = harness
        .service
        .create_media(&ctx, "pic1", vec![], &mut source(b"ABC"))
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), MediaErrorKind::Cancelled(_)));
    assert!(harness.metadata.calls().is_empty());
    assert_eq!(harness.tags.all_exist_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_concurrent_identical_uploads_converge() {
    let harness = Harness::with_checksum_barrier(2);
    let t1 = harness.tag("t1").await;
    let ctx = CallContext::new();

    let mut first_source = source(b"ABC");
    let mut second_source = source(b"ABC");
    let (first, second) = tokio::join!(
        harness
            .service
            .create_media(&ctx, "pic1", vec![t1.clone()], &mut first_source),
        harness
            .service
            .create_media(&ctx, "pic1", vec![t1.clone()], &mut second_source),
    );

    let first = first.unwrap();
    let second = second.unwrap();
    assert_eq!(first, second);

    // Both passed the lookup before either wrote, so both wrote
    let calls = harness.metadata.calls();
    assert_eq!(calls.iter().filter(|c| **c == "upsert").count(), 2);
    assert_eq!(calls.iter().filter(|c| **c == "set_upload_complete").count(), 2);
    assert_eq!(harness.blobs.inner.put_count(), 2);
    assert_eq!(harness.blobs.inner.get(first.as_str()).await.unwrap(), b"ABC");

    let records = harness.metadata.inner.find_by_tag_id(&t1).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id(), &first);
    assert!(records[0].upload_complete());
}
