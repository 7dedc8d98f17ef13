//! End-to-end tests through the facade crate.

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use img10::{
    ContentHash, ErrorCategory, FitMode, IngestRequest, IngestionPipeline, OutputFormat,
    PipelineConfig, ThumbnailSpec, ThumbnailStatus,
};
use std::io::Cursor;
use tempfile::TempDir;

fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn write_config(dir: &TempDir) -> std::path::PathBuf {
    let root = dir.path().display().to_string().replace('\\', "/");
    let path = dir.path().join("img10.toml");
    let contents = format!(
        r#"
max_upload_bytes = 1048576
allowed_types = ["png"]

[[default_specs]]
width = 64
height = 64
fit = "crop"
format = "png"

[storage]
uploads_dir = "{root}/uploads"
thumbnails_dir = "{root}/thumbnails"
config_dir = "{root}/config"
"#
    );
    std::fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn test_file_configured_pipeline_round_trip() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig::from_file(write_config(&dir)).unwrap();
    assert_eq!(*config.max_upload_bytes(), 1_048_576);
    assert_eq!(config.generation_timeout_secs(), &30);

    let pipeline = IngestionPipeline::from_config(config).await.unwrap();
    let upload = png(300, 150);
    let outcome = pipeline
        .ingest(IngestRequest::new(upload.clone()))
        .await
        .unwrap();

    assert_eq!(outcome.asset.hash(), &ContentHash::of(&upload));
    assert_eq!(outcome.renditions.len(), 1);
    assert_eq!(outcome.renditions[0].status, ThumbnailStatus::Ready);
    assert_eq!(outcome.renditions[0].width, Some(64));
    assert_eq!(outcome.renditions[0].height, Some(64));
    assert!(dir.path().join("uploads").is_dir());
    assert!(dir.path().join("config").join("index.json").is_file());

    let spec = ThumbnailSpec::new(64, 64, FitMode::Crop, OutputFormat::Png);
    let rendition = pipeline.retrieve(outcome.asset.hash(), &spec).await.unwrap();
    assert!(rendition.cache_hit);
    let decoded = image::load_from_memory(&rendition.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (64, 64));
    assert_eq!(pipeline.original(outcome.asset.hash()).await.unwrap(), upload);

    let stats = pipeline.stats().await.unwrap();
    assert_eq!(stats.index.total_assets, 1);
    assert_eq!(stats.index.ready_thumbnails, 1);
    assert_eq!(stats.originals_bytes, upload.len() as u64);

    assert!(pipeline.health().await.healthy);
}

#[tokio::test]
async fn test_allow_list_from_file_rejects_other_formats() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig::from_file(write_config(&dir)).unwrap();
    let pipeline = IngestionPipeline::from_config(config).await.unwrap();

    // JPEG is a known format but not on this allow-list
    let mut jpeg = Cursor::new(Vec::new());
    DynamicImage::new_rgb8(16, 16)
        .write_to(&mut jpeg, ImageFormat::Jpeg)
        .unwrap();
    let err = pipeline
        .ingest(IngestRequest::new(jpeg.into_inner()))
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::UnsupportedFormat);
}

#[tokio::test]
async fn test_invalid_configuration_refused() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "generation_timeout_secs = 0\n").unwrap();

    let config = PipelineConfig::from_file(&path).unwrap();
    assert!(config.validate().is_err());
    assert!(IngestionPipeline::from_config(config).await.is_err());
}
