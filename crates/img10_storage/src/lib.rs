//! Content-addressable storage for img10.
//!
//! This crate separates *where bytes live* from *what we know about them*:
//!
//! - [`MediaStorage`] - pluggable gateway persisting originals and renditions
//!   under content-derived keys ([`FileSystemStorage`] writes to disk)
//! - [`MetadataIndex`] - maps asset hashes and thumbnail keys to their records
//!   ([`FileIndex`] persists a JSON snapshot that survives restarts)
//!
//! # Features
//!
//! - **Content-addressable**: identical bytes map to the same key, so they are stored once
//! - **Atomic visibility**: temp file + rename, readers never see partial objects
//! - **Quota aware**: writes beyond the configured budget fail with `QuotaExceeded`
//!
//! # Example
//!
//! ```rust
//! use img10_core::{ContentHash, MediaType, StorageKey};
//! use img10_storage::{FileSystemStorage, MediaStorage};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = FileSystemStorage::new("/tmp/img10/uploads")?;
//!
//! let data = vec![0x89, b'P', b'N', b'G'];
//! let key = StorageKey::original(&ContentHash::of(&data), MediaType::Png);
//! let location = storage.put(&key, &data).await?;
//!
//! let retrieved = storage.get(&location).await?;
//! assert_eq!(&data[..], &retrieved[..]);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod filesystem;
mod index;

use bytes::Bytes;
use img10_core::{StorageKey, StorageLocation};
use img10_error::Img10Result;

pub use filesystem::FileSystemStorage;
pub use img10_error::{StorageError, StorageErrorKind};
pub use index::{FileIndex, IndexStats, MetadataIndex};

/// Trait for pluggable storage backends.
///
/// Implementations only move bytes; metadata is kept in a [`MetadataIndex`].
#[async_trait::async_trait]
pub trait MediaStorage: Send + Sync {
    /// Short backend name for logs (e.g. `"filesystem"`).
    fn backend(&self) -> &'static str;

    /// Store `data` under `key` and return its location.
    ///
    /// Writing a key that already exists is a no-op returning the existing
    /// location; content addressing makes the first writer authoritative.
    ///
    /// # Errors
    ///
    /// `Unavailable` for transient failures, `QuotaExceeded` when the write
    /// does not fit.
    async fn put(&self, key: &StorageKey, data: &[u8]) -> Img10Result<StorageLocation>;

    /// Read a stored object.
    async fn get(&self, location: &StorageLocation) -> Img10Result<Bytes>;

    /// Check whether an object is stored under `key`.
    async fn exists(&self, key: &StorageKey) -> Img10Result<bool>;

    /// Remove a stored object.
    async fn delete(&self, location: &StorageLocation) -> Img10Result<()>;

    /// Bytes currently accounted against this backend.
    async fn usage(&self) -> Img10Result<u64>;

    /// Verify the backend can currently be reached.
    async fn check(&self) -> Img10Result<()>;
}
