//! Tests for rendering real images through the generator.

use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use img10_core::{FitMode, MediaType, OutputFormat, ThumbnailSpec};
use img10_error::{ErrorCategory, Img10Error};
use img10_thumbnail::{
    GeneratorConfig, Renderer, ThumbnailGenerator, probe_dimensions, render_async,
};
use std::io::Cursor;
use std::sync::Arc;

fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

fn gradient_jpeg(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    encode(DynamicImage::ImageRgb8(image), ImageFormat::Jpeg)
}

fn transparent_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 128]));
    encode(DynamicImage::ImageRgba8(image), ImageFormat::Png)
}

fn decoded(bytes: &[u8]) -> DynamicImage {
    image::load_from_memory(bytes).unwrap()
}

#[test]
fn test_crop_output_is_exact() {
    let generator = ThumbnailGenerator::default();
    let source = gradient_jpeg(1200, 900);

    for (w, h) in [(200, 200), (300, 100), (64, 480)] {
        let spec = ThumbnailSpec::new(w, h, FitMode::Crop, OutputFormat::Jpeg);
        let rendition = generator.render(&source, MediaType::Jpeg, &spec).unwrap();
        assert_eq!((rendition.width, rendition.height), (w, h));
        assert_eq!(decoded(&rendition.bytes).dimensions(), (w, h));
    }
}

#[test]
fn test_contain_preserves_aspect_ratio() {
    let generator = ThumbnailGenerator::default();
    let source = gradient_jpeg(1200, 900);
    let spec = ThumbnailSpec::new(200, 200, FitMode::Contain, OutputFormat::Png);

    let rendition = generator.render(&source, MediaType::Jpeg, &spec).unwrap();
    assert_eq!((rendition.width, rendition.height), (200, 150));

    let ratio_src = 1200.0 / 900.0;
    let ratio_out = f64::from(rendition.width) / f64::from(rendition.height);
    assert!((ratio_src - ratio_out).abs() * f64::from(rendition.height) <= 1.0);
}

#[test]
fn test_small_source_is_not_upscaled() {
    let source = gradient_jpeg(80, 60);
    let spec = ThumbnailSpec::new(200, 200, FitMode::Contain, OutputFormat::Jpeg);

    let rendition = ThumbnailGenerator::default()
        .render(&source, MediaType::Jpeg, &spec)
        .unwrap();
    assert_eq!((rendition.width, rendition.height), (80, 60));

    let upscaling = ThumbnailGenerator::new(GeneratorConfig {
        allow_upscale: true,
        ..GeneratorConfig::default()
    });
    let rendition = upscaling.render(&source, MediaType::Jpeg, &spec).unwrap();
    assert_eq!((rendition.width, rendition.height), (200, 150));
}

#[test]
fn test_png_keeps_alpha_and_jpeg_drops_it() {
    let generator = ThumbnailGenerator::default();
    let source = transparent_png(100, 100);

    let png = ThumbnailSpec::new(50, 50, FitMode::Contain, OutputFormat::Png);
    let rendition = generator.render(&source, MediaType::Png, &png).unwrap();
    assert!(decoded(&rendition.bytes).color().has_alpha());

    let jpeg = ThumbnailSpec::new(50, 50, FitMode::Contain, OutputFormat::Jpeg);
    let rendition = generator.render(&source, MediaType::Png, &jpeg).unwrap();
    assert!(!decoded(&rendition.bytes).color().has_alpha());
    assert_eq!(
        image::guess_format(&rendition.bytes).unwrap(),
        ImageFormat::Jpeg
    );
}

#[test]
fn test_webp_output() {
    let generator = ThumbnailGenerator::default();
    let source = gradient_jpeg(300, 300);
    let spec = ThumbnailSpec::new(120, 120, FitMode::Crop, OutputFormat::Webp);

    let rendition = generator.render(&source, MediaType::Jpeg, &spec).unwrap();
    assert_eq!(rendition.format, OutputFormat::Webp);
    assert_eq!(
        image::guess_format(&rendition.bytes).unwrap(),
        ImageFormat::WebP
    );
    assert_eq!(decoded(&rendition.bytes).dimensions(), (120, 120));
}

#[test]
fn test_padding_fills_box() {
    let generator = ThumbnailGenerator::new(GeneratorConfig {
        pad: true,
        pad_color: [0, 0, 255, 255],
        ..GeneratorConfig::default()
    });
    let source = gradient_jpeg(400, 200);
    let spec = ThumbnailSpec::new(100, 100, FitMode::Contain, OutputFormat::Png);

    let rendition = generator.render(&source, MediaType::Jpeg, &spec).unwrap();
    let image = decoded(&rendition.bytes).to_rgba8();
    assert_eq!(image.dimensions(), (100, 100));
    // Top band is canvas, the image sits in rows 25..75.
    assert_eq!(image.get_pixel(50, 5), &Rgba([0, 0, 255, 255]));
}

#[test]
fn test_invalid_spec_rejected_before_decode() {
    let generator = ThumbnailGenerator::default();
    let spec = ThumbnailSpec::new(0, 200, FitMode::Crop, OutputFormat::Jpeg);

    // Garbage source: a decode attempt would report DecodeFailure instead.
    let err = generator
        .render(b"definitely not an image", MediaType::Jpeg, &spec)
        .unwrap_err();
    let err: Img10Error = err.into();
    assert_eq!(err.category(), ErrorCategory::UnsupportedSpec);
}

#[test]
fn test_corrupt_source_is_decode_failure() {
    let generator = ThumbnailGenerator::default();
    let mut source = gradient_jpeg(64, 64);
    source.truncate(40);
    let spec = ThumbnailSpec::new(32, 32, FitMode::Crop, OutputFormat::Jpeg);

    let err: Img10Error = generator
        .render(&source, MediaType::Jpeg, &spec)
        .unwrap_err()
        .into();
    assert_eq!(err.category(), ErrorCategory::DecodeFailure);
}

#[test]
fn test_video_is_decode_failure() {
    let spec = ThumbnailSpec::new(32, 32, FitMode::Crop, OutputFormat::Jpeg);
    let err: Img10Error = ThumbnailGenerator::default()
        .render(b"\0\0\0\x18ftypisom", MediaType::Mp4, &spec)
        .unwrap_err()
        .into();
    assert_eq!(err.category(), ErrorCategory::DecodeFailure);
}

#[test]
fn test_source_pixel_limit() {
    let generator = ThumbnailGenerator::new(GeneratorConfig {
        max_source_pixels: 1_000,
        ..GeneratorConfig::default()
    });
    let source = gradient_jpeg(100, 100);
    let spec = ThumbnailSpec::new(10, 10, FitMode::Crop, OutputFormat::Jpeg);

    let err: Img10Error = generator
        .render(&source, MediaType::Jpeg, &spec)
        .unwrap_err()
        .into();
    assert_eq!(err.category(), ErrorCategory::DecodeFailure);
}

#[test]
fn test_probe_dimensions() {
    let source = transparent_png(33, 17);
    assert_eq!(probe_dimensions(&source, MediaType::Png).unwrap(), (33, 17));
    assert!(probe_dimensions(b"nope", MediaType::Png).is_err());
}

#[test]
fn test_generator_config_from_toml() {
    let config: GeneratorConfig = toml::from_str("allow_upscale = true").unwrap();
    assert!(config.allow_upscale);
    assert_eq!(config.max_source_pixels, GeneratorConfig::default().max_source_pixels);
}

#[tokio::test]
async fn test_render_async_runs_on_blocking_pool() {
    let renderer: Arc<dyn Renderer> = Arc::new(ThumbnailGenerator::default());
    let source = bytes::Bytes::from(gradient_jpeg(400, 300));
    let spec = ThumbnailSpec::new(100, 100, FitMode::Crop, OutputFormat::Jpeg);

    let rendition = render_async(renderer, source, MediaType::Jpeg, spec)
        .await
        .unwrap();
    assert_eq!((rendition.width, rendition.height), (100, 100));
}
