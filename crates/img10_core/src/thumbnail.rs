//! Derived thumbnail records.

use crate::{ContentHash, SpecHash, StorageLocation, ThumbnailSpec};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Identity of a rendition: (asset hash, spec hash).
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[display("{}/{}", asset, spec)]
pub struct ThumbnailKey {
    asset: ContentHash,
    spec: SpecHash,
}

impl ThumbnailKey {
    /// Key for `spec` rendered from `asset`.
    pub fn new(asset: ContentHash, spec: &ThumbnailSpec) -> Self {
        Self {
            asset,
            spec: spec.spec_hash(),
        }
    }

    /// Source asset hash.
    pub fn asset(&self) -> &ContentHash {
        &self.asset
    }

    /// Spec hash.
    pub fn spec(&self) -> &SpecHash {
        &self.spec
    }
}

/// Generation state of a thumbnail.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailStatus {
    /// Generation is in flight
    #[display("pending")]
    Pending,
    /// Rendition is stored and may be served
    #[display("ready")]
    Ready,
    /// Last attempt failed; the next request retries
    #[display("failed")]
    Failed,
}

/// Derived rendition of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Thumbnail {
    key: ThumbnailKey,
    spec: ThumbnailSpec,
    status: ThumbnailStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<StorageLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    updated_at: DateTime<Utc>,
}

impl Thumbnail {
    /// A rendition that is being generated right now.
    pub fn pending(asset: ContentHash, spec: ThumbnailSpec) -> Self {
        Self {
            key: ThumbnailKey::new(asset, &spec),
            spec,
            status: ThumbnailStatus::Pending,
            location: None,
            width: None,
            height: None,
            error: None,
            updated_at: Utc::now(),
        }
    }

    /// A stored rendition.
    pub fn ready(
        asset: ContentHash,
        spec: ThumbnailSpec,
        location: StorageLocation,
        width: u32,
        height: u32,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key: ThumbnailKey::new(asset, &spec),
            spec,
            status: ThumbnailStatus::Ready,
            location: Some(location),
            width: Some(width),
            height: Some(height),
            error: None,
            updated_at: generated_at,
        }
    }

    /// A rendition whose last attempt failed.
    pub fn failed(
        asset: ContentHash,
        spec: ThumbnailSpec,
        reason: impl Into<String>,
        failed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key: ThumbnailKey::new(asset, &spec),
            spec,
            status: ThumbnailStatus::Failed,
            location: None,
            width: None,
            height: None,
            error: Some(reason.into()),
            updated_at: failed_at,
        }
    }

    /// Whether the rendition can be served without generating.
    pub fn is_ready(&self) -> bool {
        self.status == ThumbnailStatus::Ready
    }
}
