//! Media type enumeration.

use serde::{Deserialize, Serialize};

/// Broad family of a media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum MediaKind {
    /// Still raster image
    #[display("image")]
    Image,
    /// Video container
    #[display("video")]
    Video,
}

/// Media type determined from content, never from filenames.
///
/// Displays as its MIME type.
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
pub enum MediaType {
    /// JPEG image
    #[display("image/jpeg")]
    Jpeg,
    /// PNG image
    #[display("image/png")]
    Png,
    /// GIF image
    #[display("image/gif")]
    Gif,
    /// WebP image
    #[display("image/webp")]
    Webp,
    /// Windows bitmap
    #[display("image/bmp")]
    Bmp,
    /// TIFF image
    #[display("image/tiff")]
    Tiff,
    /// MPEG-4 / ISO base media video
    #[display("video/mp4")]
    Mp4,
    /// WebM (Matroska) video
    #[display("video/webm")]
    Webm,
}

impl MediaType {
    /// MIME type string.
    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Gif => "image/gif",
            MediaType::Webp => "image/webp",
            MediaType::Bmp => "image/bmp",
            MediaType::Tiff => "image/tiff",
            MediaType::Mp4 => "video/mp4",
            MediaType::Webm => "video/webm",
        }
    }

    /// File extension used for stored originals.
    pub fn extension(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "jpg",
            MediaType::Png => "png",
            MediaType::Gif => "gif",
            MediaType::Webp => "webp",
            MediaType::Bmp => "bmp",
            MediaType::Tiff => "tiff",
            MediaType::Mp4 => "mp4",
            MediaType::Webm => "webm",
        }
    }

    /// Broad family of this type.
    pub fn kind(&self) -> MediaKind {
        match self {
            MediaType::Mp4 | MediaType::Webm => MediaKind::Video,
            _ => MediaKind::Image,
        }
    }

    /// Short lowercase name as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "jpeg",
            MediaType::Png => "png",
            MediaType::Gif => "gif",
            MediaType::Webp => "webp",
            MediaType::Bmp => "bmp",
            MediaType::Tiff => "tiff",
            MediaType::Mp4 => "mp4",
            MediaType::Webm => "webm",
        }
    }
}

impl std::str::FromStr for MediaType {
    type Err = String;

    /// Accepts either a MIME type (`image/png`) or a short name (`png`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let name = normalized
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .rsplit('/')
            .next()
            .unwrap_or_default();
        match name {
            "jpeg" | "jpg" | "pjpeg" => Ok(MediaType::Jpeg),
            "png" => Ok(MediaType::Png),
            "gif" => Ok(MediaType::Gif),
            "webp" => Ok(MediaType::Webp),
            "bmp" | "x-ms-bmp" => Ok(MediaType::Bmp),
            "tiff" | "tif" => Ok(MediaType::Tiff),
            "mp4" => Ok(MediaType::Mp4),
            "webm" => Ok(MediaType::Webm),
            _ => Err(format!("Unknown media type: {}", s)),
        }
    }
}
