//! Thumbnail generator - decodes an original and renders one spec.
//!
//! Rendering is CPU bound. Call [`render_async`] from async code so the work
//! runs on the blocking pool instead of a runtime worker.

use crate::geometry::{RenderPlan, plan};
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader, Limits, Rgba, RgbaImage};
use img10_core::{MediaType, OutputFormat, ThumbnailSpec};
use img10_error::{ThumbnailError, ThumbnailErrorKind};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

/// Options shared by every rendition.
///
/// Changing these does not change rendition keys; stale renditions are
/// replaced with `invalidate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Allow renditions larger than the source
    pub allow_upscale: bool,
    /// Pad `contain` renditions onto a canvas of the exact target size
    pub pad: bool,
    /// RGBA canvas colour used when padding; JPEG output drops the alpha
    pub pad_color: [u8; 4],
    /// Largest source (width × height) that will be decoded
    pub max_source_pixels: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            allow_upscale: false,
            pad: false,
            pad_color: [0, 0, 0, 0],
            max_source_pixels: 100_000_000,
        }
    }
}

/// Encoded rendition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendition {
    /// Encoded bytes
    pub bytes: Bytes,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Encoding of `bytes`
    pub format: OutputFormat,
}

/// Produces rendition bytes from an original.
///
/// Implementations are pure transformations; persistence is the caller's job.
pub trait Renderer: Send + Sync {
    /// Render `spec` from `source`.
    ///
    /// # Errors
    ///
    /// `UnsupportedSpec` before any decode when the spec is invalid,
    /// `DecodeFailure` when the source cannot be decoded, `Encode` when the
    /// rendition cannot be written.
    fn render(
        &self,
        source: &[u8],
        media_type: MediaType,
        spec: &ThumbnailSpec,
    ) -> Result<Rendition, ThumbnailError>;
}

/// Renderer backed by the `image` crate.
#[derive(Debug, Clone, Default)]
pub struct ThumbnailGenerator {
    config: GeneratorConfig,
}

fn image_format(media_type: MediaType) -> Result<ImageFormat, ThumbnailError> {
    match media_type {
        MediaType::Jpeg => Ok(ImageFormat::Jpeg),
        MediaType::Png => Ok(ImageFormat::Png),
        MediaType::Gif => Ok(ImageFormat::Gif),
        MediaType::Webp => Ok(ImageFormat::WebP),
        MediaType::Bmp => Ok(ImageFormat::Bmp),
        MediaType::Tiff => Ok(ImageFormat::Tiff),
        MediaType::Mp4 | MediaType::Webm => Err(ThumbnailError::new(
            ThumbnailErrorKind::DecodeFailure(format!(
                "frame extraction is not available for {}",
                media_type
            )),
        )),
    }
}

fn decode_failure(err: impl std::fmt::Display) -> ThumbnailError {
    ThumbnailError::new(ThumbnailErrorKind::DecodeFailure(err.to_string()))
}

/// Read pixel dimensions from the header without decoding the image.
///
/// # Errors
///
/// `DecodeFailure` when the header is unreadable or the type is a video.
pub fn probe_dimensions(source: &[u8], media_type: MediaType) -> Result<(u32, u32), ThumbnailError> {
    let format = image_format(media_type)?;
    ImageReader::with_format(Cursor::new(source), format)
        .into_dimensions()
        .map_err(decode_failure)
}

impl ThumbnailGenerator {
    /// Create a generator with the given options.
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Options in effect.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn decode(&self, source: &[u8], media_type: MediaType) -> Result<DynamicImage, ThumbnailError> {
        let format = image_format(media_type)?;

        let (width, height) = probe_dimensions(source, media_type)?;
        let pixels = u64::from(width) * u64::from(height);
        if pixels > self.config.max_source_pixels {
            return Err(decode_failure(format!(
                "source is {}x{} ({} pixels), limit is {}",
                width, height, pixels, self.config.max_source_pixels
            )));
        }

        let mut limits = Limits::default();
        // RGBA at 16 bits per channel is the widest buffer decoders allocate.
        limits.max_alloc = Some(self.config.max_source_pixels.saturating_mul(8));

        let mut reader = ImageReader::with_format(Cursor::new(source), format);
        reader.limits(limits);
        reader.decode().map_err(decode_failure)
    }

    fn apply(&self, image: DynamicImage, plan: &RenderPlan) -> DynamicImage {
        let mut image = if plan.resamples(image.dimensions()) {
            let (width, height) = plan.resize;
            image.resize_exact(width, height, FilterType::Lanczos3)
        } else {
            image
        };

        if let Some(crop) = plan.crop {
            image = image.crop_imm(crop.x, crop.y, crop.width, crop.height);
        }

        if let Some(pad) = plan.pad {
            let mut canvas = RgbaImage::from_pixel(
                pad.canvas_width,
                pad.canvas_height,
                Rgba(self.config.pad_color),
            );
            image::imageops::overlay(
                &mut canvas,
                &image.to_rgba8(),
                i64::from(pad.x),
                i64::from(pad.y),
            );
            image = DynamicImage::ImageRgba8(canvas);
        }

        image
    }

    fn encode(
        image: &DynamicImage,
        format: OutputFormat,
        quality: u8,
    ) -> Result<Bytes, ThumbnailError> {
        let mut buf = Vec::new();
        let encode_failure =
            |e: image::ImageError| ThumbnailError::new(ThumbnailErrorKind::Encode(e.to_string()));

        match format {
            OutputFormat::Jpeg => {
                let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
                rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))
                    .map_err(encode_failure)?;
            }
            OutputFormat::Png | OutputFormat::Webp => {
                let pixels = if image.color().has_alpha() {
                    DynamicImage::ImageRgba8(image.to_rgba8())
                } else {
                    DynamicImage::ImageRgb8(image.to_rgb8())
                };
                let written = if format == OutputFormat::Png {
                    pixels.write_with_encoder(PngEncoder::new(&mut buf))
                } else {
                    pixels.write_with_encoder(WebPEncoder::new_lossless(&mut buf))
                };
                written.map_err(encode_failure)?;
            }
        }

        Ok(Bytes::from(buf))
    }
}

impl Renderer for ThumbnailGenerator {
    #[tracing::instrument(skip(self, source, spec), fields(size = source.len(), spec = %spec))]
    fn render(
        &self,
        source: &[u8],
        media_type: MediaType,
        spec: &ThumbnailSpec,
    ) -> Result<Rendition, ThumbnailError> {
        spec.validate()?;

        let image = self.decode(source, media_type)?;
        let (src_width, src_height) = image.dimensions();
        let plan = plan(
            src_width,
            src_height,
            spec,
            self.config.allow_upscale,
            self.config.pad,
        );
        debug!(src_width, src_height, ?plan, "Planned rendition");

        let rendered = self.apply(image, &plan);
        let (width, height) = rendered.dimensions();
        let bytes = Self::encode(&rendered, *spec.format(), *spec.quality())?;

        debug!(width, height, size = bytes.len(), "Rendition generated");
        Ok(Rendition {
            bytes,
            width,
            height,
            format: *spec.format(),
        })
    }
}

/// Render on the blocking thread pool.
///
/// # Errors
///
/// Everything [`Renderer::render`] returns, plus `TaskFailed` if the
/// blocking task panics.
pub async fn render_async(
    renderer: Arc<dyn Renderer>,
    source: Bytes,
    media_type: MediaType,
    spec: ThumbnailSpec,
) -> Result<Rendition, ThumbnailError> {
    tokio::task::spawn_blocking(move || renderer.render(&source, media_type, &spec))
        .await
        .map_err(|e| ThumbnailError::new(ThumbnailErrorKind::TaskFailed(e.to_string())))?
}
