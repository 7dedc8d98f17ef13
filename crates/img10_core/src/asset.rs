//! Stored original uploads.

use crate::{ContentHash, MediaType, StorageLocation};
use chrono::{DateTime, TimeDelta, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// An uploaded original, identified by the hash of its bytes.
///
/// Assets are never mutated after creation; identical uploads resolve to the
/// same asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Asset {
    /// Content hash (identity)
    hash: ContentHash,
    /// Sniffed media type
    media_type: MediaType,
    /// Size of the original in bytes
    size_bytes: u64,
    /// Pixel width when the header could be probed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    /// Pixel height when the header could be probed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
    /// When the first upload of these bytes was accepted
    created_at: DateTime<Utc>,
    /// Where the original is stored
    location: StorageLocation,
}

impl Asset {
    /// Describe a newly stored original.
    pub fn new(
        hash: ContentHash,
        media_type: MediaType,
        size_bytes: u64,
        location: StorageLocation,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            hash,
            media_type,
            size_bytes,
            width: None,
            height: None,
            created_at,
            location,
        }
    }

    /// Attach probed pixel dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Whether the asset is older than `retention` at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, retention: TimeDelta) -> bool {
        self.created_at + retention < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry() {
        let created = Utc::now();
        let asset = Asset::new(
            ContentHash::of(b"x"),
            MediaType::Png,
            1,
            StorageLocation::new("aa/bb/x.png"),
            created,
        );
        let day = TimeDelta::hours(24);
        assert!(!asset.is_expired(created + TimeDelta::hours(23), day));
        assert!(asset.is_expired(created + TimeDelta::hours(25), day));
    }

    #[test]
    fn test_serde_omits_unknown_dimensions() {
        let asset = Asset::new(
            ContentHash::of(b"x"),
            MediaType::Jpeg,
            1,
            StorageLocation::new("aa/bb/x.jpg"),
            Utc::now(),
        );
        let json = serde_json::to_value(&asset).unwrap();
        assert!(json.get("width").is_none());
        assert_eq!(json["media_type"], "jpeg");

        let back: Asset = serde_json::from_value(json).unwrap();
        assert_eq!(back, asset);
    }
}
