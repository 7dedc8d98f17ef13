//! Test utilities for pipeline tests.
//!
//! Instrumented renderers and storage backends plus image fixtures.

#![allow(dead_code)]

use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use img10_core::{MediaType, StorageKey, StorageLocation, ThumbnailSpec};
use img10_error::{Img10Result, StorageError, StorageErrorKind, ThumbnailError, ThumbnailErrorKind};
use img10_pipeline::{IngestionPipeline, PipelineConfig, RetryConfig, StorageConfig};
use img10_storage::{FileIndex, FileSystemStorage, MediaStorage, MetadataIndex};
use img10_thumbnail::{Renderer, Rendition, ThumbnailGenerator};
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// Encode a gradient so every pixel differs from its neighbours.
pub fn gradient(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * 7 + y) % 256) as u8])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut buf, format)
        .unwrap();
    buf.into_inner()
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    gradient(width, height, ImageFormat::Jpeg)
}

/// Defaults rooted in `dir` with millisecond retry delays.
pub fn test_config(dir: &TempDir) -> PipelineConfig {
    PipelineConfig::default()
        .with_storage(StorageConfig::under(dir.path()))
        .with_retry(RetryConfig {
            initial_backoff_ms: 1,
            max_delay_ms: 5,
            max_retries: 3,
        })
}

/// Renderer that counts calls and optionally stalls or fails first.
pub struct CountingRenderer {
    inner: ThumbnailGenerator,
    calls: Arc<AtomicUsize>,
    delay: Duration,
    fail_first: usize,
}

impl CountingRenderer {
    pub fn new() -> Self {
        Self {
            inner: ThumbnailGenerator::default(),
            calls: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
            fail_first: 0,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_first(mut self, attempts: usize) -> Self {
        self.fail_first = attempts;
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl Renderer for CountingRenderer {
    fn render(
        &self,
        source: &[u8],
        media_type: MediaType,
        spec: &ThumbnailSpec,
    ) -> Result<Rendition, ThumbnailError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        if call < self.fail_first {
            return Err(ThumbnailError::new(ThumbnailErrorKind::DecodeFailure(
                "injected failure".to_string(),
            )));
        }
        self.inner.render(source, media_type, spec)
    }
}

/// Storage whose first `put` calls fail with a transient error.
pub struct FlakyStorage {
    inner: FileSystemStorage,
    failures_left: AtomicUsize,
    puts: AtomicUsize,
}

impl FlakyStorage {
    pub fn new(inner: FileSystemStorage, failures: usize) -> Self {
        Self {
            inner,
            failures_left: AtomicUsize::new(failures),
            puts: AtomicUsize::new(0),
        }
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MediaStorage for FlakyStorage {
    fn backend(&self) -> &'static str {
        "flaky"
    }

    async fn put(&self, key: &StorageKey, data: &[u8]) -> Img10Result<StorageLocation> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StorageError::new(StorageErrorKind::Unavailable("injected".into())).into());
        }
        self.inner.put(key, data).await
    }

    async fn get(&self, location: &StorageLocation) -> Img10Result<Bytes> {
        self.inner.get(location).await
    }

    async fn exists(&self, key: &StorageKey) -> Img10Result<bool> {
        self.inner.exists(key).await
    }

    async fn delete(&self, location: &StorageLocation) -> Img10Result<()> {
        self.inner.delete(location).await
    }

    async fn usage(&self) -> Img10Result<u64> {
        self.inner.usage().await
    }

    async fn check(&self) -> Img10Result<()> {
        self.inner.check().await
    }
}

/// Components of a pipeline assembled by hand.
pub struct Parts {
    pub originals: Arc<dyn MediaStorage>,
    pub thumbnails: Arc<dyn MediaStorage>,
    pub index: Arc<dyn MetadataIndex>,
    pub renderer: Arc<dyn Renderer>,
}

impl Parts {
    /// Filesystem storage under the config's roots with an in-memory index.
    pub fn filesystem(config: &PipelineConfig, renderer: impl Renderer + 'static) -> Self {
        let storage = config.storage();
        Self {
            originals: Arc::new(FileSystemStorage::new(&storage.uploads_dir).unwrap()),
            thumbnails: Arc::new(FileSystemStorage::new(&storage.thumbnails_dir).unwrap()),
            index: Arc::new(FileIndex::in_memory()),
            renderer: Arc::new(renderer),
        }
    }

    pub fn build(self, config: PipelineConfig) -> IngestionPipeline {
        IngestionPipeline::new(
            config,
            self.originals,
            self.thumbnails,
            self.index,
            self.renderer,
        )
    }
}
