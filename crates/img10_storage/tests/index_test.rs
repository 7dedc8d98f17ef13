//! Tests for the persisted metadata index.

use chrono::{TimeDelta, Utc};
use img10_core::{
    Asset, ContentHash, FitMode, MediaType, OutputFormat, StorageKey, StorageLocation, Thumbnail,
    ThumbnailKey, ThumbnailSpec, ThumbnailStatus,
};
use img10_storage::{FileIndex, MetadataIndex};
use tempfile::TempDir;

fn asset(data: &[u8], age_hours: i64) -> Asset {
    let hash = ContentHash::of(data);
    let location = StorageLocation::from(&StorageKey::original(&hash, MediaType::Jpeg));
    Asset::new(
        hash,
        MediaType::Jpeg,
        data.len() as u64,
        location,
        Utc::now() - TimeDelta::hours(age_hours),
    )
}

fn spec() -> ThumbnailSpec {
    ThumbnailSpec::new(200, 200, FitMode::Contain, OutputFormat::Jpeg)
}

fn ready(asset: &Asset, spec: &ThumbnailSpec) -> Thumbnail {
    let key = StorageKey::thumbnail(asset.hash(), &spec.spec_hash(), *spec.format());
    Thumbnail::ready(
        asset.hash().clone(),
        spec.clone(),
        StorageLocation::from(&key),
        200,
        150,
        Utc::now(),
    )
}

#[tokio::test]
async fn test_insert_is_first_writer_wins() {
    let index = FileIndex::in_memory();
    let first = asset(b"same bytes", 2);
    let second = asset(b"same bytes", 0);

    let (stored, inserted) = index.insert_asset_if_absent(first.clone()).await.unwrap();
    assert!(inserted);
    assert_eq!(stored, first);

    let (stored, inserted) = index.insert_asset_if_absent(second).await.unwrap();
    assert!(!inserted);
    assert_eq!(stored.created_at(), first.created_at());
    assert_eq!(index.list_assets().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_never_overwrites_ready() {
    let index = FileIndex::in_memory();
    let a = asset(b"img", 0);
    let spec = spec();
    let key = ThumbnailKey::new(a.hash().clone(), &spec);

    let failed = Thumbnail::failed(a.hash().clone(), spec.clone(), "decode", Utc::now());
    assert!(index.record_failed(failed.clone()).await.unwrap());
    assert_eq!(
        *index.get_thumbnail(&key).await.unwrap().unwrap().status(),
        ThumbnailStatus::Failed
    );

    // A later success replaces the failure.
    index.record_ready(ready(&a, &spec)).await.unwrap();
    assert!(!index.record_failed(failed).await.unwrap());
    let record = index.get_thumbnail(&key).await.unwrap().unwrap();
    assert!(record.is_ready());
    assert_eq!(*record.width(), Some(200));
}

#[tokio::test]
async fn test_remove_asset_returns_thumbnails() {
    let index = FileIndex::in_memory();
    let a = asset(b"a", 0);
    let b = asset(b"b", 0);
    index.insert_asset_if_absent(a.clone()).await.unwrap();
    index.insert_asset_if_absent(b.clone()).await.unwrap();

    let small = spec();
    let large = ThumbnailSpec::new(800, 600, FitMode::Crop, OutputFormat::Png);
    index.record_ready(ready(&a, &small)).await.unwrap();
    index.record_ready(ready(&a, &large)).await.unwrap();
    index.record_ready(ready(&b, &small)).await.unwrap();

    let (removed, thumbnails) = index.remove_asset(a.hash()).await.unwrap().unwrap();
    assert_eq!(removed, a);
    assert_eq!(thumbnails.len(), 2);
    assert!(index.thumbnails_for(a.hash()).await.unwrap().is_empty());
    assert_eq!(index.thumbnails_for(b.hash()).await.unwrap().len(), 1);

    assert!(index.remove_asset(a.hash()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_stats() {
    let index = FileIndex::in_memory();
    assert_eq!(index.stats().await.unwrap().total_assets, 0);

    let old = asset(b"old upload", 20);
    let new = asset(b"new", 1);
    index.insert_asset_if_absent(old.clone()).await.unwrap();
    index.insert_asset_if_absent(new.clone()).await.unwrap();
    index.record_ready(ready(&old, &spec())).await.unwrap();
    index
        .record_failed(Thumbnail::failed(
            new.hash().clone(),
            spec(),
            "boom",
            Utc::now(),
        ))
        .await
        .unwrap();

    let stats = index.stats().await.unwrap();
    assert_eq!(stats.total_assets, 2);
    assert_eq!(stats.total_bytes, 13);
    assert_eq!(stats.oldest, Some(*old.created_at()));
    assert_eq!(stats.newest, Some(*new.created_at()));
    assert_eq!(stats.ready_thumbnails, 1);
    assert_eq!(stats.failed_thumbnails, 1);

    let listed = index.list_assets().await.unwrap();
    assert_eq!(listed.first().map(Asset::hash), Some(old.hash()));
}

#[tokio::test]
async fn test_index_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config").join("index.json");

    let a = asset(b"persisted", 3);
    let spec = spec();
    {
        let index = FileIndex::open(&path).await.unwrap();
        index.insert_asset_if_absent(a.clone()).await.unwrap();
        index.record_ready(ready(&a, &spec)).await.unwrap();
    }
    assert!(path.exists());

    let reopened = FileIndex::open(&path).await.unwrap();
    assert_eq!(reopened.get_asset(a.hash()).await.unwrap(), Some(a.clone()));
    let key = ThumbnailKey::new(a.hash().clone(), &spec);
    let record = reopened.get_thumbnail(&key).await.unwrap().unwrap();
    assert!(record.is_ready());
    assert_eq!(record.spec(), &spec);
}

#[tokio::test]
async fn test_every_write_rewrites_the_full_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("index.json");
    let index = FileIndex::open(&path).await.unwrap();

    let first = asset(b"first", 1);
    let second = asset(b"second", 1);
    index.insert_asset_if_absent(first.clone()).await.unwrap();
    std::fs::remove_file(&path).unwrap();

    // Writes that change nothing do not commit.
    index.insert_asset_if_absent(first.clone()).await.unwrap();
    assert!(index.remove_asset(second.hash()).await.unwrap().is_none());
    assert!(!path.exists());

    index.insert_asset_if_absent(second.clone()).await.unwrap();
    let reopened = FileIndex::open(&path).await.unwrap();
    assert_eq!(reopened.get_asset(first.hash()).await.unwrap(), Some(first));
    assert_eq!(reopened.get_asset(second.hash()).await.unwrap(), Some(second));
}

#[tokio::test]
async fn test_corrupt_index_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("index.json");
    std::fs::write(&path, b"{ not json").unwrap();

    let err = FileIndex::open(&path).await.err().unwrap();
    assert!(format!("{}", err).contains("Metadata index error"));
}
