//! Filesystem-based storage implementation.
//!
//! Objects are written under content-derived relative keys, so identical
//! bytes land on the same path and are stored once.

use crate::MediaStorage;
use bytes::Bytes;
use img10_core::{StorageKey, StorageLocation};
use img10_error::{Img10Result, StorageError, StorageErrorKind};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Filesystem storage backend.
///
/// One instance owns one root directory; the pipeline uses separate roots for
/// originals and thumbnails.
///
/// # Example Structure
///
/// ```text
/// uploads/
/// ├── 2c/
/// │   └── f2/
/// │       └── 2cf24dba5fb0a30e....png
/// thumbnails/
/// └── 2c/
///     └── f2/
///         └── 2cf24dba5fb0a30e.../
///             └── 9f86d081884c7d65.jpg
/// ```
///
/// # Features
///
/// - **Automatic deduplication**: an existing key is never rewritten
/// - **Atomic writes**: unique temp file, fsync, then rename
/// - **Quota**: optional byte budget, seeded from the existing tree on startup
pub struct FileSystemStorage {
    root: PathBuf,
    quota_bytes: Option<u64>,
    used_bytes: AtomicU64,
}

impl FileSystemStorage {
    /// Create a new filesystem storage backend.
    ///
    /// Creates the root directory if it doesn't exist and measures the bytes
    /// already stored beneath it.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or accessed.
    #[tracing::instrument(skip(root))]
    pub fn new(root: impl Into<PathBuf>) -> Img10Result<Self> {
        let root = root.into();

        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                root.display(),
                e
            )))
        })?;

        let used = walkdir::WalkDir::new(&root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| entry.metadata().ok())
            .map(|meta| meta.len())
            .sum();

        tracing::info!(path = %root.display(), used_bytes = used, "Opened filesystem storage");
        Ok(Self {
            root,
            quota_bytes: None,
            used_bytes: AtomicU64::new(used),
        })
    }

    /// Limit the total bytes this backend may hold.
    pub fn with_quota(mut self, quota_bytes: Option<u64>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    /// Root directory of this backend.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative key or location beneath the root.
    ///
    /// Only plain path segments are accepted, so nothing can escape the root.
    fn resolve(&self, relative: &str) -> Img10Result<PathBuf> {
        let relative_path = Path::new(relative);
        let is_plain = !relative.is_empty()
            && relative_path
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(StorageError::new(StorageErrorKind::InvalidPath(relative.to_string())).into());
        }
        Ok(self.root.join(relative_path))
    }

    fn reserve(&self, len: u64) -> Img10Result<()> {
        let Some(quota) = self.quota_bytes else {
            self.used_bytes.fetch_add(len, Ordering::SeqCst);
            return Ok(());
        };

        self.used_bytes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                used.checked_add(len).filter(|total| *total <= quota)
            })
            .map(|_| ())
            .map_err(|used| {
                StorageError::new(StorageErrorKind::QuotaExceeded(format!(
                    "{} bytes requested, {} of {} bytes used",
                    len, used, quota
                )))
                .into()
            })
    }

    fn release(&self, len: u64) {
        // Saturating: files removed behind our back may already be unaccounted.
        let _ = self
            .used_bytes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                Some(used.saturating_sub(len))
            });
    }

    async fn write_atomically(&self, path: &Path, data: &[u8]) -> Img10Result<()> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let temp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

        let result: Result<(), StorageError> = async {
            let mut file = tokio::fs::File::create(&temp_path)
                .await
                .map_err(|e| StorageError::from_io(format!("create {}", temp_path.display()), &e))?;
            file.write_all(data)
                .await
                .map_err(|e| StorageError::from_io(format!("write {}", temp_path.display()), &e))?;
            file.sync_all()
                .await
                .map_err(|e| StorageError::from_io(format!("sync {}", temp_path.display()), &e))?;
            drop(file);

            tokio::fs::rename(&temp_path, path).await.map_err(|e| {
                StorageError::from_io(
                    format!("rename {} to {}", temp_path.display(), path.display()),
                    &e,
                )
            })
        }
        .await;

        if result.is_err() {
            let _ = tokio::fs::remove_file(&temp_path).await;
        }
        Ok(result?)
    }
}

#[async_trait::async_trait]
impl MediaStorage for FileSystemStorage {
    fn backend(&self) -> &'static str {
        "filesystem"
    }

    #[tracing::instrument(skip(self, key, data), fields(key = %key, size = data.len()))]
    async fn put(&self, key: &StorageKey, data: &[u8]) -> Img10Result<StorageLocation> {
        let path = self.resolve(key.as_str())?;
        let location = StorageLocation::from(key);

        // If file already exists, just return its location (deduplication)
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!(path = %path.display(), "Object already exists, returning existing location");
            return Ok(location);
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let len = data.len() as u64;
        self.reserve(len)?;
        if let Err(e) = self.write_atomically(&path, data).await {
            self.release(len);
            return Err(e);
        }

        tracing::info!(path = %path.display(), size = data.len(), "Stored object");
        Ok(location)
    }

    #[tracing::instrument(skip(self, location), fields(location = %location))]
    async fn get(&self, location: &StorageLocation) -> Img10Result<Bytes> {
        let path = self.resolve(location.as_str())?;

        let data = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(location.to_string()))
            } else {
                StorageError::from_io(format!("read {}", path.display()), &e)
            }
        })?;

        tracing::debug!(path = %path.display(), size = data.len(), "Retrieved object");
        Ok(Bytes::from(data))
    }

    #[tracing::instrument(skip(self, key), fields(key = %key))]
    async fn exists(&self, key: &StorageKey) -> Img10Result<bool> {
        let path = self.resolve(key.as_str())?;
        Ok(tokio::fs::try_exists(&path)
            .await
            .map_err(|e| StorageError::from_io(format!("stat {}", path.display()), &e))?)
    }

    #[tracing::instrument(skip(self, location), fields(location = %location))]
    async fn delete(&self, location: &StorageLocation) -> Img10Result<()> {
        let path = self.resolve(location.as_str())?;

        let len = tokio::fs::metadata(&path).await.map(|m| m.len()).ok();
        tokio::fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(location.to_string()))
            } else {
                StorageError::from_io(format!("delete {}", path.display()), &e)
            }
        })?;
        if let Some(len) = len {
            self.release(len);
        }

        tracing::info!(path = %path.display(), "Deleted object");
        Ok(())
    }

    async fn usage(&self) -> Img10Result<u64> {
        Ok(self.used_bytes.load(Ordering::SeqCst))
    }

    async fn check(&self) -> Img10Result<()> {
        let meta = tokio::fs::metadata(&self.root)
            .await
            .map_err(|e| StorageError::from_io(format!("stat {}", self.root.display()), &e))?;
        if !meta.is_dir() {
            return Err(StorageError::new(StorageErrorKind::Unavailable(format!(
                "{} is not a directory",
                self.root.display()
            )))
            .into());
        }
        Ok(())
    }
}
