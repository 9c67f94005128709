//! Tests for the snapshot-backed metadata and tag stores.

use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;
use tagvault_core::{MediaId, MediaMetadata, MediaMetadataBuilder, TagId};
use tagvault_storage::{FileMetadataStore, FileTagStore, MetadataStore, TagStore};
use tempfile::TempDir;

const HOUR: Duration = Duration::from_secs(3600);
const MINUTE: Duration = Duration::from_secs(60);

fn record(id: &str, checksum: &str, complete: bool, age_secs: i64) -> MediaMetadata {
    MediaMetadataBuilder::default()
        .id(id)
        .name(format!("name-{}", id))
        .tag_ids(vec![TagId::from("t1")])
        .checksum(checksum)
        .upload_complete(complete)
        .last_update(Utc::now() - ChronoDuration::seconds(age_secs))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_metadata_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metadata.json");

    let store = FileMetadataStore::open(&path, MINUTE).unwrap();
    store.upsert(&record("aaaa", "c1", false, 0)).await.unwrap();
    store.upsert(&record("bbbb", "c2", false, 0)).await.unwrap();
    store
        .set_upload_complete(&MediaId::from("aaaa"), true)
        .await
        .unwrap();
    drop(store);

    let reopened = FileMetadataStore::open(&path, MINUTE).unwrap();
    assert_eq!(reopened.len().await, 2);
    assert!(reopened.get(&MediaId::from("aaaa")).await.unwrap().upload_complete());
    let found = reopened.find_by_checksum("c1").await.unwrap().unwrap();
    assert_eq!(found.id(), &MediaId::from("aaaa"));
}

#[tokio::test]
async fn test_delete_all_is_persisted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metadata.json");

    let store = FileMetadataStore::open(&path, MINUTE).unwrap();
    store.upsert(&record("aaaa", "c1", true, 0)).await.unwrap();
    store.upsert(&record("bbbb", "c2", true, 0)).await.unwrap();
    store.delete_all(&[MediaId::from("aaaa")]).await.unwrap();

    let reopened = FileMetadataStore::open(&path, MINUTE).unwrap();
    assert_eq!(reopened.len().await, 1);
    assert!(reopened.get(&MediaId::from("aaaa")).await.is_err());
}

#[tokio::test]
async fn test_stale_pending_record_expires_after_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metadata.json");

    let store = FileMetadataStore::open(&path, HOUR).unwrap();
    store.upsert(&record("aaaa", "c1", false, 120)).await.unwrap();
    store.upsert(&record("bbbb", "c2", true, 120)).await.unwrap();
    assert_eq!(store.len().await, 2);

    let reopened = FileMetadataStore::open(&path, MINUTE).unwrap();
    assert_eq!(reopened.len().await, 1, "only the complete record is kept");
    assert!(reopened.find_by_checksum("c1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_purge_expired_rewrites_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metadata.json");

    let store = FileMetadataStore::open(&path, HOUR).unwrap();
    store.upsert(&record("aaaa", "c1", false, 120)).await.unwrap();

    let short = FileMetadataStore::open(&path, MINUTE).unwrap();
    assert_eq!(short.purge_expired().await.unwrap(), 1);
    assert_eq!(short.purge_expired().await.unwrap(), 0);

    let long = FileMetadataStore::open(&path, HOUR).unwrap();
    assert!(long.is_empty().await);
}

#[tokio::test]
async fn test_expiry_sweeper_persists_purge() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metadata.json");

    let store = FileMetadataStore::open(&path, HOUR).unwrap();
    store.upsert(&record("aaaa", "c1", false, 120)).await.unwrap();

    let short = FileMetadataStore::open(&path, MINUTE).unwrap();
    let sweeper = short.spawn_expiry_sweeper(Duration::from_millis(20));
    tokio::time::sleep(Duration::from_millis(200)).await;
    sweeper.abort();

    let long = FileMetadataStore::open(&path, HOUR).unwrap();
    assert!(long.is_empty().await);
}

#[tokio::test]
async fn test_state_dir_is_created_on_first_write() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("state").join("metadata.json");

    let store = FileMetadataStore::open(&path, MINUTE).unwrap();
    assert!(!path.exists());
    store.upsert(&record("aaaa", "c1", true, 0)).await.unwrap();

    assert!(path.exists());
    assert_eq!(store.path(), path.as_path());
    let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_unreadable_snapshot_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metadata.json");

    std::fs::write(&path, b"{ not json").unwrap();
    assert!(FileMetadataStore::open(&path, MINUTE).is_err());

    std::fs::write(&path, br#"{"schema_version": 99, "entries": []}"#).unwrap();
    assert!(FileMetadataStore::open(&path, MINUTE).is_err());

    std::fs::write(&path, br#"{"schema_version": 1, "entries": []}"#).unwrap();
    assert!(FileMetadataStore::open(&path, MINUTE).is_ok());
}

#[tokio::test]
async fn test_tags_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tags.json");

    let store = FileTagStore::open(&path).unwrap();
    let holiday = store.create_tag("holiday").await.unwrap();
    let work = store.create_tag("work").await.unwrap();
    let gone = store.create_tag("gone").await.unwrap();
    store.delete_tags(&[gone.clone()]).await.unwrap();
    drop(store);

    let reopened = FileTagStore::open(&path).unwrap();
    let names: Vec<String> = reopened
        .list_tags()
        .await
        .unwrap()
        .iter()
        .map(|tag| tag.name().clone())
        .collect();
    assert_eq!(names, vec!["holiday".to_string(), "work".to_string()]);
    assert!(reopened.all_exist(&[holiday.clone(), work]).await.unwrap());
    assert!(!reopened.all_exist(&[gone]).await.unwrap());

    assert_eq!(reopened.create_tag("holiday").await.unwrap(), holiday);
}
