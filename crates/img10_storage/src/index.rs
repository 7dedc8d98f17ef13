//! Persisted metadata index.
//!
//! Maps asset hashes to [`Asset`] records and thumbnail keys to [`Thumbnail`]
//! records. [`FileIndex`] keeps the whole index in memory and commits a JSON
//! snapshot after every mutation.

use chrono::{DateTime, Utc};
use img10_core::{Asset, ContentHash, Thumbnail, ThumbnailKey, ThumbnailStatus};
use img10_error::{Img10Result, StorageError, StorageErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Aggregate counts over the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of stored originals
    pub total_assets: usize,
    /// Bytes held by stored originals
    pub total_bytes: u64,
    /// Creation time of the oldest asset
    pub oldest: Option<DateTime<Utc>>,
    /// Creation time of the newest asset
    pub newest: Option<DateTime<Utc>>,
    /// Thumbnails recorded as ready
    pub ready_thumbnails: usize,
    /// Thumbnails whose last attempt failed
    pub failed_thumbnails: usize,
}

/// Lookup and bookkeeping for assets and their renditions.
///
/// Every mutation is durable once the returned future resolves.
#[async_trait::async_trait]
pub trait MetadataIndex: Send + Sync {
    /// Look up an asset by hash.
    async fn get_asset(&self, hash: &ContentHash) -> Img10Result<Option<Asset>>;

    /// Insert `asset` unless one with the same hash exists.
    ///
    /// Returns the stored record and whether this call inserted it. When two
    /// uploads race, the first insert wins and the second gets its record.
    async fn insert_asset_if_absent(&self, asset: Asset) -> Img10Result<(Asset, bool)>;

    /// All assets, oldest first.
    async fn list_assets(&self) -> Img10Result<Vec<Asset>>;

    /// Remove an asset together with its thumbnail records.
    async fn remove_asset(&self, hash: &ContentHash)
    -> Img10Result<Option<(Asset, Vec<Thumbnail>)>>;

    /// Look up a thumbnail record.
    async fn get_thumbnail(&self, key: &ThumbnailKey) -> Img10Result<Option<Thumbnail>>;

    /// Thumbnail records derived from `asset`.
    async fn thumbnails_for(&self, asset: &ContentHash) -> Img10Result<Vec<Thumbnail>>;

    /// Record a stored rendition, replacing any earlier record for its key.
    async fn record_ready(&self, thumbnail: Thumbnail) -> Img10Result<()>;

    /// Record a failed attempt.
    ///
    /// Returns `false` without writing when the key is already ready.
    async fn record_failed(&self, thumbnail: Thumbnail) -> Img10Result<bool>;

    /// Drop a thumbnail record.
    async fn remove_thumbnail(&self, key: &ThumbnailKey) -> Img10Result<Option<Thumbnail>>;

    /// Aggregate counts.
    async fn stats(&self) -> Img10Result<IndexStats>;
}

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Default)]
struct IndexState {
    assets: HashMap<ContentHash, Asset>,
    thumbnails: HashMap<ThumbnailKey, Thumbnail>,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    assets: Vec<Asset>,
    thumbnails: Vec<Thumbnail>,
}

impl From<&IndexState> for Snapshot {
    fn from(state: &IndexState) -> Self {
        let mut assets: Vec<Asset> = state.assets.values().cloned().collect();
        assets.sort_by(|a, b| a.hash().cmp(b.hash()));
        let mut thumbnails: Vec<Thumbnail> = state
            .thumbnails
            .values()
            .filter(|t| *t.status() != ThumbnailStatus::Pending)
            .cloned()
            .collect();
        thumbnails.sort_by(|a, b| a.key().cmp(b.key()));
        Self {
            version: SNAPSHOT_VERSION,
            assets,
            thumbnails,
        }
    }
}

impl From<Snapshot> for IndexState {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            assets: snapshot
                .assets
                .into_iter()
                .map(|a| (a.hash().clone(), a))
                .collect(),
            thumbnails: snapshot
                .thumbnails
                .into_iter()
                .map(|t| (t.key().clone(), t))
                .collect(),
        }
    }
}

/// JSON-file backed [`MetadataIndex`].
///
/// Mutations are applied to a copy of the state, committed to disk with a
/// temp file and rename, and only then published. A failed commit leaves
/// both memory and disk at the previous state.
pub struct FileIndex {
    path: Option<PathBuf>,
    state: RwLock<IndexState>,
}

impl FileIndex {
    /// Open the index stored at `path`, starting empty if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `Index` if the file exists but cannot be parsed.
    #[tracing::instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Img10Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let state = match tokio::fs::read(&path).await {
            Ok(raw) => {
                let snapshot: Snapshot = serde_json::from_slice(&raw).map_err(|e| {
                    StorageError::new(StorageErrorKind::Index(format!(
                        "{}: {}",
                        path.display(),
                        e
                    )))
                })?;
                if snapshot.version != SNAPSHOT_VERSION {
                    return Err(StorageError::new(StorageErrorKind::Index(format!(
                        "{}: unsupported index version {}",
                        path.display(),
                        snapshot.version
                    )))
                    .into());
                }
                IndexState::from(snapshot)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => IndexState::default(),
            Err(e) => {
                return Err(StorageError::from_io(format!("read {}", path.display()), &e).into());
            }
        };

        tracing::info!(
            assets = state.assets.len(),
            thumbnails = state.thumbnails.len(),
            "Opened metadata index"
        );
        Ok(Self {
            path: Some(path),
            state: RwLock::new(state),
        })
    }

    /// An index that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(IndexState::default()),
        }
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn commit(&self, state: &IndexState) -> Img10Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let raw = serde_json::to_vec_pretty(&Snapshot::from(state))
            .map_err(|e| StorageError::new(StorageErrorKind::Index(e.to_string())))?;

        let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&temp_path, &raw).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StorageError::from_io(format!("write {}", temp_path.display()), &e).into());
        }
        if let Err(e) = tokio::fs::rename(&temp_path, path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StorageError::from_io(format!("commit {}", path.display()), &e).into());
        }

        tracing::trace!(path = %path.display(), size = raw.len(), "Committed metadata index");
        Ok(())
    }

    /// Apply `mutate` to a copy of the state, commit, then publish.
    ///
    /// The closure returns `None` to signal that nothing changed, and no
    /// commit happens. Otherwise the whole state is cloned and the full
    /// snapshot rewritten under the write lock, so each write costs time
    /// proportional to the index size and writers are serialized.
    async fn mutate<T>(
        &self,
        mutate: impl FnOnce(&mut IndexState) -> Option<T>,
    ) -> Img10Result<Option<T>> {
        let mut guard = self.state.write().await;
        let mut next = guard.clone();
        let Some(result) = mutate(&mut next) else {
            return Ok(None);
        };
        self.commit(&next).await?;
        *guard = next;
        Ok(Some(result))
    }
}

#[async_trait::async_trait]
impl MetadataIndex for FileIndex {
    async fn get_asset(&self, hash: &ContentHash) -> Img10Result<Option<Asset>> {
        Ok(self.state.read().await.assets.get(hash).cloned())
    }

    #[tracing::instrument(skip(self, asset), fields(hash = %asset.hash()))]
    async fn insert_asset_if_absent(&self, asset: Asset) -> Img10Result<(Asset, bool)> {
        let hash = asset.hash().clone();
        let inserted = self
            .mutate(|state| {
                if state.assets.contains_key(&hash) {
                    return None;
                }
                state.assets.insert(hash.clone(), asset.clone());
                Some(asset)
            })
            .await?;

        match inserted {
            Some(asset) => {
                tracing::debug!("Indexed new asset");
                Ok((asset, true))
            }
            None => {
                let existing = self.state.read().await.assets.get(&hash).cloned();
                existing.map(|a| (a, false)).ok_or_else(|| {
                    StorageError::new(StorageErrorKind::Index(format!(
                        "asset {} vanished during insert",
                        hash
                    )))
                    .into()
                })
            }
        }
    }

    async fn list_assets(&self) -> Img10Result<Vec<Asset>> {
        let mut assets: Vec<Asset> = self.state.read().await.assets.values().cloned().collect();
        assets.sort_by(|a, b| {
            a.created_at()
                .cmp(b.created_at())
                .then_with(|| a.hash().cmp(b.hash()))
        });
        Ok(assets)
    }

    #[tracing::instrument(skip(self), fields(hash = %hash))]
    async fn remove_asset(
        &self,
        hash: &ContentHash,
    ) -> Img10Result<Option<(Asset, Vec<Thumbnail>)>> {
        self.mutate(|state| {
            let asset = state.assets.remove(hash)?;
            let keys: Vec<ThumbnailKey> = state
                .thumbnails
                .keys()
                .filter(|k| k.asset() == hash)
                .cloned()
                .collect();
            let thumbnails = keys
                .iter()
                .filter_map(|k| state.thumbnails.remove(k))
                .collect();
            Some((asset, thumbnails))
        })
        .await
    }

    async fn get_thumbnail(&self, key: &ThumbnailKey) -> Img10Result<Option<Thumbnail>> {
        Ok(self.state.read().await.thumbnails.get(key).cloned())
    }

    async fn thumbnails_for(&self, asset: &ContentHash) -> Img10Result<Vec<Thumbnail>> {
        let mut thumbnails: Vec<Thumbnail> = self
            .state
            .read()
            .await
            .thumbnails
            .values()
            .filter(|t| t.key().asset() == asset)
            .cloned()
            .collect();
        thumbnails.sort_by(|a, b| a.key().cmp(b.key()));
        Ok(thumbnails)
    }

    #[tracing::instrument(skip(self, thumbnail), fields(key = %thumbnail.key()))]
    async fn record_ready(&self, thumbnail: Thumbnail) -> Img10Result<()> {
        self.mutate(|state| {
            state.thumbnails.insert(thumbnail.key().clone(), thumbnail);
            Some(())
        })
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, thumbnail), fields(key = %thumbnail.key()))]
    async fn record_failed(&self, thumbnail: Thumbnail) -> Img10Result<bool> {
        let recorded = self
            .mutate(|state| {
                let key = thumbnail.key().clone();
                if state.thumbnails.get(&key).is_some_and(Thumbnail::is_ready) {
                    return None;
                }
                state.thumbnails.insert(key, thumbnail);
                Some(())
            })
            .await?;
        if recorded.is_none() {
            tracing::debug!("Kept ready record over failed attempt");
        }
        Ok(recorded.is_some())
    }

    #[tracing::instrument(skip(self), fields(key = %key))]
    async fn remove_thumbnail(&self, key: &ThumbnailKey) -> Img10Result<Option<Thumbnail>> {
        self.mutate(|state| state.thumbnails.remove(key)).await
    }

    async fn stats(&self) -> Img10Result<IndexStats> {
        let state = self.state.read().await;
        let mut stats = IndexStats {
            total_assets: state.assets.len(),
            ..IndexStats::default()
        };
        for asset in state.assets.values() {
            stats.total_bytes += asset.size_bytes();
            let created = *asset.created_at();
            stats.oldest = Some(stats.oldest.map_or(created, |o| o.min(created)));
            stats.newest = Some(stats.newest.map_or(created, |n| n.max(created)));
        }
        for thumbnail in state.thumbnails.values() {
            match thumbnail.status() {
                ThumbnailStatus::Ready => stats.ready_thumbnails += 1,
                ThumbnailStatus::Failed => stats.failed_thumbnails += 1,
                ThumbnailStatus::Pending => {}
            }
        }
        Ok(stats)
    }
}
