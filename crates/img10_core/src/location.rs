//! Content-addressed storage keys and locations.

use crate::{ContentHash, MediaType, OutputFormat, SpecHash};
use serde::{Deserialize, Serialize};

/// Relative, content-derived key under which an object is written.
///
/// Layout:
///
/// ```text
/// originals:  {hash[0:2]}/{hash[2:4]}/{hash}.{ext}
/// thumbnails: {asset[0:2]}/{asset[2:4]}/{asset}/{spec_hash}.{ext}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub struct StorageKey(String);

impl StorageKey {
    /// Key for an original upload.
    pub fn original(hash: &ContentHash, media_type: MediaType) -> Self {
        let (a, b) = hash.shards();
        Self(format!("{}/{}/{}.{}", a, b, hash, media_type.extension()))
    }

    /// Key for a rendition of `asset` under `spec_hash`.
    pub fn thumbnail(asset: &ContentHash, spec_hash: &SpecHash, format: OutputFormat) -> Self {
        let (a, b) = asset.shards();
        Self(format!(
            "{}/{}/{}/{}.{}",
            a,
            b,
            asset,
            spec_hash,
            format.extension()
        ))
    }

    /// Relative path string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Where a stored object can be read back from.
///
/// Locations are relative to the backend's root so the on-disk tree can be
/// moved without rewriting the metadata index.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(transparent)]
pub struct StorageLocation(String);

impl StorageLocation {
    /// Wrap a backend-relative location.
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    /// Relative path string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&StorageKey> for StorageLocation {
    fn from(key: &StorageKey) -> Self {
        Self(key.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FitMode, ThumbnailSpec};

    #[test]
    fn test_original_layout() {
        let hash = ContentHash::of(b"hello");
        let key = StorageKey::original(&hash, MediaType::Png);
        assert_eq!(key.as_str(), format!("2c/f2/{}.png", hash));
    }

    #[test]
    fn test_thumbnail_layout() {
        let hash = ContentHash::of(b"hello");
        let spec = ThumbnailSpec::new(200, 200, FitMode::Crop, OutputFormat::Webp);
        let key = StorageKey::thumbnail(&hash, &spec.spec_hash(), *spec.format());
        assert_eq!(
            key.as_str(),
            format!("2c/f2/{}/{}.webp", hash, spec.spec_hash())
        );
        assert_eq!(StorageLocation::from(&key).as_str(), key.as_str());
    }
}
