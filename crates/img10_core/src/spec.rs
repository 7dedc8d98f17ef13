//! Thumbnail rendition descriptors.

use crate::SpecHash;
use derive_getters::Getters;
use img10_error::{ThumbnailError, ThumbnailErrorKind};
use serde::{Deserialize, Serialize};

/// Largest width or height a rendition may request.
pub const MAX_DIMENSION: u32 = 8192;

/// Output quality used when a spec does not name one.
pub const DEFAULT_QUALITY: u8 = 85;

/// How the source aspect ratio maps onto the target box.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Fit inside the box, preserving aspect ratio
    #[default]
    #[display("contain")]
    Contain,
    /// Cover the box, then centre-crop to exact dimensions
    #[display("crop")]
    Crop,
}

impl std::str::FromStr for FitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contain" => Ok(FitMode::Contain),
            "crop" | "cover" => Ok(FitMode::Crop),
            _ => Err(format!("Unknown fit mode: {}", s)),
        }
    }
}

/// Encoding of a rendered thumbnail.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Baseline JPEG (alpha is flattened)
    #[default]
    #[display("jpeg")]
    Jpeg,
    /// PNG with alpha
    #[display("png")]
    Png,
    /// Lossless WebP
    #[display("webp")]
    Webp,
}

impl OutputFormat {
    /// MIME type of encoded renditions.
    pub fn mime(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Webp => "image/webp",
        }
    }

    /// File extension of stored renditions.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
        }
    }

    /// Whether the encoding can carry transparency.
    pub fn supports_alpha(&self) -> bool {
        !matches!(self, OutputFormat::Jpeg)
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::Webp),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Target rendition descriptor.
///
/// Specs are immutable values identified by their canonical serialization
/// `"{w}x{h}:{fit}:{format}:q{quality}"`. Construction never fails; call
/// [`ThumbnailSpec::validate`] before doing any work with one.
///
/// # Examples
///
/// ```
/// use img10_core::{FitMode, OutputFormat, ThumbnailSpec};
///
/// let spec: ThumbnailSpec = "200x200:crop".parse().unwrap();
/// assert_eq!(*spec.fit(), FitMode::Crop);
/// assert_eq!(*spec.format(), OutputFormat::Jpeg);
/// assert!(spec.validate().is_ok());
///
/// let zero: ThumbnailSpec = "0x200".parse().unwrap();
/// assert!(zero.validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
pub struct ThumbnailSpec {
    width: u32,
    height: u32,
    #[serde(default)]
    fit: FitMode,
    #[serde(default)]
    format: OutputFormat,
    #[serde(default = "default_quality")]
    quality: u8,
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

impl ThumbnailSpec {
    /// Create a spec with the default quality.
    pub fn new(width: u32, height: u32, fit: FitMode, format: OutputFormat) -> Self {
        Self {
            width,
            height,
            fit,
            format,
            quality: DEFAULT_QUALITY,
        }
    }

    /// Set the encoder quality (1..=100, JPEG only).
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Canonical serialization; equal specs always serialize identically.
    pub fn canonical(&self) -> String {
        format!(
            "{}x{}:{}:{}:q{}",
            self.width, self.height, self.fit, self.format, self.quality
        )
    }

    /// Stable identity derived from the canonical form.
    ///
    /// Renderer-wide options (padding, upscaling) are not part of it, so a
    /// rendition stored under one setting keeps being served after the
    /// setting changes until it is invalidated.
    pub fn spec_hash(&self) -> SpecHash {
        SpecHash::of_canonical(&self.canonical())
    }

    /// Reject specs that can never be rendered.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedSpec` for zero dimensions, dimensions above
    /// [`MAX_DIMENSION`], or quality outside `1..=100`.
    #[track_caller]
    pub fn validate(&self) -> Result<(), ThumbnailError> {
        let reason = if self.width == 0 || self.height == 0 {
            Some(format!(
                "dimensions must be positive, got {}x{}",
                self.width, self.height
            ))
        } else if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            Some(format!(
                "dimensions {}x{} exceed maximum of {}",
                self.width, self.height, MAX_DIMENSION
            ))
        } else if !(1..=100).contains(&self.quality) {
            Some(format!("quality must be within 1..=100, got {}", self.quality))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(ThumbnailError::new(ThumbnailErrorKind::UnsupportedSpec(
                reason,
            ))),
            None => Ok(()),
        }
    }
}

impl std::fmt::Display for ThumbnailSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl std::str::FromStr for ThumbnailSpec {
    type Err = String;

    /// Parses `"{w}x{h}[:{fit}[:{format}[:q{quality}]]]"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split(':');
        let dims = parts.next().unwrap_or_default();
        let (width, height) = dims
            .split_once(&['x', 'X'][..])
            .ok_or_else(|| format!("Spec dimensions must look like WxH, got '{}'", dims))?;
        let width: u32 = width
            .parse()
            .map_err(|e| format!("Invalid width '{}': {}", width, e))?;
        let height: u32 = height
            .parse()
            .map_err(|e| format!("Invalid height '{}': {}", height, e))?;

        let mut spec = ThumbnailSpec::new(width, height, FitMode::default(), OutputFormat::default());
        if let Some(fit) = parts.next() {
            spec.fit = fit.parse()?;
        }
        if let Some(format) = parts.next() {
            spec.format = format.parse()?;
        }
        if let Some(quality) = parts.next() {
            let digits = quality.strip_prefix(&['q', 'Q'][..]).unwrap_or(quality);
            spec.quality = digits
                .parse()
                .map_err(|e| format!("Invalid quality '{}': {}", quality, e))?;
        }
        if let Some(extra) = parts.next() {
            return Err(format!("Unexpected spec segment '{}'", extra));
        }
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_round_trip() {
        let spec = ThumbnailSpec::new(320, 240, FitMode::Contain, OutputFormat::Png).with_quality(70);
        let canonical = spec.canonical();
        assert_eq!(canonical, "320x240:contain:png:q70");
        assert_eq!(canonical.parse::<ThumbnailSpec>().unwrap(), spec);
    }

    #[test]
    fn test_spec_hash_distinguishes_fields() {
        let a = ThumbnailSpec::new(200, 200, FitMode::Crop, OutputFormat::Jpeg);
        let b = ThumbnailSpec::new(200, 200, FitMode::Contain, OutputFormat::Jpeg);
        assert_ne!(a.spec_hash(), b.spec_hash());
        assert_eq!(a.spec_hash(), a.clone().spec_hash());
        assert_eq!(a.spec_hash().as_str().len(), 16);
    }

    #[test]
    fn test_validate() {
        assert!(ThumbnailSpec::new(0, 10, FitMode::Crop, OutputFormat::Jpeg).validate().is_err());
        assert!(ThumbnailSpec::new(10, 0, FitMode::Crop, OutputFormat::Jpeg).validate().is_err());
        assert!(
            ThumbnailSpec::new(MAX_DIMENSION + 1, 10, FitMode::Crop, OutputFormat::Jpeg)
                .validate()
                .is_err()
        );
        assert!(
            ThumbnailSpec::new(10, 10, FitMode::Crop, OutputFormat::Jpeg)
                .with_quality(0)
                .validate()
                .is_err()
        );
        assert!(ThumbnailSpec::new(10, 10, FitMode::Crop, OutputFormat::Jpeg).validate().is_ok());
    }

    #[test]
    fn test_parse_errors() {
        assert!("200".parse::<ThumbnailSpec>().is_err());
        assert!("axb".parse::<ThumbnailSpec>().is_err());
        assert!("200x200:stretch".parse::<ThumbnailSpec>().is_err());
        assert!("200x200:crop:jpeg:q50:extra".parse::<ThumbnailSpec>().is_err());
        assert!("-1x200".parse::<ThumbnailSpec>().is_err());
    }
}
