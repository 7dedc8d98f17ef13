//! Core data types for img10.
//!
//! This crate defines the data model shared by every component of the
//! pipeline:
//!
//! - [`ContentHash`] - SHA-256 identity of uploaded bytes
//! - [`MediaType`] - Sniffed media classification
//! - [`Asset`] - A stored original upload
//! - [`ThumbnailSpec`] - Canonical description of a rendition
//! - [`Thumbnail`] - Derived artifact keyed by [`ThumbnailKey`]
//! - [`StorageKey`] / [`StorageLocation`] - Content-addressed storage paths
//!
//! # Example
//!
//! ```
//! use img10_core::{ContentHash, FitMode, OutputFormat, ThumbnailKey, ThumbnailSpec};
//!
//! let hash = ContentHash::of(b"some image bytes");
//! let spec = ThumbnailSpec::new(200, 200, FitMode::Crop, OutputFormat::Jpeg);
//! let key = ThumbnailKey::new(hash.clone(), &spec);
//!
//! assert_eq!(key.asset(), &hash);
//! assert_eq!(spec.canonical(), "200x200:crop:jpeg:q85");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod asset;
mod hash;
mod location;
mod media;
mod spec;
mod thumbnail;

pub use asset::Asset;
pub use hash::{ContentHash, SpecHash};
pub use location::{StorageKey, StorageLocation};
pub use media::{MediaKind, MediaType};
pub use spec::{DEFAULT_QUALITY, FitMode, MAX_DIMENSION, OutputFormat, ThumbnailSpec};
pub use thumbnail::{Thumbnail, ThumbnailKey, ThumbnailStatus};
