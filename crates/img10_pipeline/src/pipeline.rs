//! Ingestion and retrieval orchestration.

use crate::retry::with_retry;
use crate::{DerivationMode, PipelineConfig};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use img10_cache::{GenerationCoordinator, MetricsSnapshot};
use img10_core::{
    Asset, ContentHash, MediaKind, MediaType, StorageKey, StorageLocation, Thumbnail,
    ThumbnailKey, ThumbnailSpec, ThumbnailStatus,
};
use img10_error::{
    ErrorCategory, FormatError, FormatErrorKind, Img10Error, Img10Result, IngestError,
    IngestErrorKind, StorageError, StorageErrorKind,
};
use img10_sniff::Sniffer;
use img10_storage::{FileIndex, FileSystemStorage, IndexStats, MediaStorage, MetadataIndex};
use img10_thumbnail::{Renderer, ThumbnailGenerator, probe_dimensions, render_async};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// An upload handed to [`IngestionPipeline::ingest`].
#[derive(Debug, Clone, Default, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct IngestRequest {
    /// Uploaded bytes
    #[setters(skip)]
    pub bytes: Bytes,
    /// Content type claimed by the client; logged when it disagrees, never trusted
    #[setters(strip_option, into)]
    pub declared_type: Option<String>,
    /// Renditions to derive; empty means the configured defaults
    pub specs: Vec<ThumbnailSpec>,
}

impl IngestRequest {
    /// Request ingestion of `bytes` with the default specs.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            ..Self::default()
        }
    }
}

/// Outcome of deriving one spec during ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenditionReport {
    /// Requested spec
    pub spec: ThumbnailSpec,
    /// State after ingestion returned
    pub status: ThumbnailStatus,
    /// Stored location when ready
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<StorageLocation>,
    /// Output width when ready
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Output height when ready
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Failure category when failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Failure message when failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RenditionReport {
    fn ready(thumbnail: &Thumbnail) -> Self {
        Self {
            spec: thumbnail.spec().clone(),
            status: ThumbnailStatus::Ready,
            location: thumbnail.location().clone(),
            width: *thumbnail.width(),
            height: *thumbnail.height(),
            category: None,
            error: None,
        }
    }

    fn pending(spec: ThumbnailSpec) -> Self {
        Self {
            spec,
            status: ThumbnailStatus::Pending,
            location: None,
            width: None,
            height: None,
            category: None,
            error: None,
        }
    }

    fn failed(spec: ThumbnailSpec, error: &Img10Error) -> Self {
        Self {
            spec,
            status: ThumbnailStatus::Failed,
            location: None,
            width: None,
            height: None,
            category: Some(error.category().to_string()),
            error: Some(error.to_string()),
        }
    }
}

/// Result of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    /// Stored asset (the existing one for duplicate uploads)
    pub asset: Asset,
    /// Sniffed media type
    pub media_type: MediaType,
    /// Whether identical bytes were already stored
    pub deduplicated: bool,
    /// One report per requested spec, in request order
    pub renditions: Vec<RenditionReport>,
    /// Whether any synchronously derived rendition failed
    pub degraded: bool,
}

/// Rendition bytes returned by [`IngestionPipeline::retrieve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenditionBytes {
    /// Index record of the rendition
    pub thumbnail: Thumbnail,
    /// Encoded image
    pub bytes: Bytes,
    /// Served from a stored rendition without generating
    pub cache_hit: bool,
}

/// Aggregate counters across the index, storage and coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Index counts
    #[serde(flatten)]
    pub index: IndexStats,
    /// Bytes held by the originals backend
    pub originals_bytes: u64,
    /// Bytes held by the thumbnails backend
    pub thumbnails_bytes: u64,
    /// Generations currently in flight
    pub in_flight: usize,
    /// Coordinator counters since startup
    pub generation: MetricsSnapshot,
}

/// Reachability of one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentHealth {
    /// Whether the check passed
    pub ok: bool,
    /// Failure detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ComponentHealth {
    fn from_result<T>(result: Img10Result<T>) -> Self {
        match result {
            Ok(_) => Self {
                ok: true,
                detail: None,
            },
            Err(e) => Self {
                ok: false,
                detail: Some(e.to_string()),
            },
        }
    }
}

/// Outcome of [`IngestionPipeline::health`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// All components passed
    pub healthy: bool,
    /// Originals backend
    pub originals: ComponentHealth,
    /// Thumbnails backend
    pub thumbnails: ComponentHealth,
    /// Metadata index
    pub index: ComponentHealth,
}

/// Value shared by every request attached to one generation.
#[derive(Debug, Clone)]
struct Generated {
    thumbnail: Thumbnail,
    bytes: Bytes,
    /// Rendered by this generation rather than found ready in the index
    fresh: bool,
}

struct PipelineInner {
    config: PipelineConfig,
    sniffer: Sniffer,
    originals: Arc<dyn MediaStorage>,
    thumbnails: Arc<dyn MediaStorage>,
    index: Arc<dyn MetadataIndex>,
    renderer: Arc<dyn Renderer>,
    coordinator: GenerationCoordinator<ThumbnailKey, Generated>,
}

/// Entry point for ingesting uploads and serving their thumbnails.
///
/// Cloning is cheap and every clone shares the same storage, index and
/// in-flight generations.
///
/// # Example
///
/// ```no_run
/// use img10_pipeline::{IngestRequest, IngestionPipeline, PipelineConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pipeline = IngestionPipeline::from_config(PipelineConfig::load(None)?).await?;
///
/// let outcome = pipeline
///     .ingest(IngestRequest::new(std::fs::read("photo.jpg")?))
///     .await?;
/// println!("stored {}", outcome.asset.hash());
///
/// let spec = "200x200:crop".parse()?;
/// let rendition = pipeline.retrieve(outcome.asset.hash(), &spec).await?;
/// std::fs::write("thumb.jpg", &rendition.bytes)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct IngestionPipeline {
    inner: Arc<PipelineInner>,
}

impl IngestionPipeline {
    /// Assemble a pipeline from explicit components.
    pub fn new(
        config: PipelineConfig,
        originals: Arc<dyn MediaStorage>,
        thumbnails: Arc<dyn MediaStorage>,
        index: Arc<dyn MetadataIndex>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        let coordinator = GenerationCoordinator::new(config.generation_timeout());
        info!(
            originals = originals.backend(),
            thumbnails = thumbnails.backend(),
            derivation = %config.derivation(),
            "Created ingestion pipeline"
        );
        Self {
            inner: Arc::new(PipelineInner {
                config,
                sniffer: Sniffer::default(),
                originals,
                thumbnails,
                index,
                renderer,
                coordinator,
            }),
        }
    }

    /// Build the filesystem-backed pipeline described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, a storage root
    /// cannot be created or the persisted index cannot be read.
    #[instrument(skip(config))]
    pub async fn from_config(config: PipelineConfig) -> Img10Result<Self> {
        config.validate()?;
        let storage = config.storage();

        let originals =
            FileSystemStorage::new(&storage.uploads_dir)?.with_quota(storage.quota_bytes);
        let thumbnails =
            FileSystemStorage::new(&storage.thumbnails_dir)?.with_quota(storage.quota_bytes);
        let index = FileIndex::open(storage.index_path()).await?;
        let renderer = ThumbnailGenerator::new(config.generator().clone());

        Ok(Self::new(
            config,
            Arc::new(originals),
            Arc::new(thumbnails),
            Arc::new(index),
            Arc::new(renderer),
        ))
    }

    /// Active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.inner.config
    }

    /// Accept an upload, store it once, and derive its thumbnails.
    ///
    /// Rendition failures are reported per spec and never fail the upload;
    /// `degraded` is set instead.
    ///
    /// # Errors
    ///
    /// - `InvalidUpload` for empty or oversized uploads
    /// - `UnsupportedFormat` when the content is unrecognized, not allowed,
    ///   or an image whose header cannot be parsed
    /// - `StorageUnavailable` / `QuotaExceeded` when the original cannot be stored
    #[instrument(
        skip(self, request),
        fields(size = request.bytes.len(), declared = ?request.declared_type)
    )]
    pub async fn ingest(&self, request: IngestRequest) -> Img10Result<IngestOutcome> {
        let IngestRequest {
            bytes,
            declared_type,
            specs,
        } = request;
        let config = &self.inner.config;

        if bytes.is_empty() {
            return Err(IngestError::new(IngestErrorKind::Empty).into());
        }

        let media_type = self.inner.sniffer.classify_declared(
            &bytes,
            declared_type.as_deref(),
            config.allowed_types(),
        )?;

        let size = bytes.len() as u64;
        if size > *config.max_upload_bytes() {
            return Err(IngestError::new(IngestErrorKind::TooLarge {
                size,
                max: *config.max_upload_bytes(),
            })
            .into());
        }

        let dimensions = match media_type.kind() {
            MediaKind::Image => {
                let (width, height) = probe_dimensions(&bytes, media_type).map_err(|e| {
                    warn!(%media_type, error = %e.kind, "Rejecting unreadable header");
                    FormatError::new(FormatErrorKind::Unreadable(
                        media_type.mime().to_string(),
                        e.kind.to_string(),
                    ))
                })?;
                Some((width, height))
            }
            MediaKind::Video => None,
        };

        let hash = ContentHash::of(&bytes);
        let (asset, deduplicated) = self
            .store_original(hash, media_type, dimensions, &bytes)
            .await?;

        let specs = if specs.is_empty() {
            config.default_specs().clone()
        } else {
            specs
        };
        let renditions = self.derive(&asset, specs).await;
        let degraded = renditions
            .iter()
            .any(|report| report.status == ThumbnailStatus::Failed);

        info!(
            hash = %asset.hash(),
            media_type = %media_type,
            deduplicated,
            renditions = renditions.len(),
            degraded,
            "Ingested upload"
        );

        Ok(IngestOutcome {
            asset,
            media_type,
            deduplicated,
            renditions,
            degraded,
        })
    }

    /// Resolve `hash` to its asset, storing the original if it is new.
    async fn store_original(
        &self,
        hash: ContentHash,
        media_type: MediaType,
        dimensions: Option<(u32, u32)>,
        bytes: &Bytes,
    ) -> Img10Result<(Asset, bool)> {
        let inner = &self.inner;

        if let Some(existing) = inner.index.get_asset(&hash).await? {
            if !self.is_expired(&existing, Utc::now()) {
                debug!(hash = %hash, "Upload matches stored asset");
                return Ok((existing, true));
            }
            // Re-uploading expired bytes starts a fresh retention window.
            info!(hash = %hash, "Replacing expired asset");
            self.purge(&hash).await?;
        }

        let key = StorageKey::original(&hash, media_type);
        let location = with_retry(inner.config.retry(), "store original", || {
            inner.originals.put(&key, bytes)
        })
        .await?;

        let mut asset = Asset::new(
            hash.clone(),
            media_type,
            bytes.len() as u64,
            location,
            Utc::now(),
        );
        if let Some((width, height)) = dimensions {
            asset = asset.with_dimensions(width, height);
        }

        let (asset, inserted) = inner.index.insert_asset_if_absent(asset).await?;
        Ok((asset, !inserted))
    }

    async fn derive(&self, asset: &Asset, specs: Vec<ThumbnailSpec>) -> Vec<RenditionReport> {
        match self.inner.config.derivation() {
            DerivationMode::Synchronous => {
                join_all(specs.into_iter().map(|spec| self.derive_now(asset, spec))).await
            }
            DerivationMode::Deferred => {
                join_all(specs.into_iter().map(|spec| self.derive_later(asset, spec, false)))
                    .await
            }
            DerivationMode::Background => {
                join_all(specs.into_iter().map(|spec| self.derive_later(asset, spec, true)))
                    .await
            }
        }
    }

    async fn derive_now(&self, asset: &Asset, spec: ThumbnailSpec) -> RenditionReport {
        if let Err(e) = spec.validate() {
            return RenditionReport::failed(spec, &e.into());
        }
        match self.ensure(asset, &spec).await {
            Ok(thumbnail) => RenditionReport::ready(&thumbnail),
            Err(e) => {
                warn!(hash = %asset.hash(), spec = %spec, error = %e, "Rendition failed");
                RenditionReport::failed(spec, &e)
            }
        }
    }

    async fn derive_later(
        &self,
        asset: &Asset,
        spec: ThumbnailSpec,
        spawn: bool,
    ) -> RenditionReport {
        if let Err(e) = spec.validate() {
            return RenditionReport::failed(spec, &e.into());
        }
        let key = ThumbnailKey::new(asset.hash().clone(), &spec);
        if let Ok(Some(ready)) = self.ready_record(&key).await {
            return RenditionReport::ready(&ready);
        }

        if spawn {
            let pipeline = self.clone();
            let asset = asset.clone();
            let background_spec = spec.clone();
            tokio::spawn(async move {
                if let Err(e) = pipeline.ensure(&asset, &background_spec).await {
                    warn!(
                        hash = %asset.hash(),
                        spec = %background_spec,
                        error = %e,
                        "Background rendition failed"
                    );
                }
            });
        }
        RenditionReport::pending(spec)
    }

    /// The ready record for `spec`, generating it if needed.
    async fn ensure(&self, asset: &Asset, spec: &ThumbnailSpec) -> Img10Result<Thumbnail> {
        let key = ThumbnailKey::new(asset.hash().clone(), spec);
        if let Some(ready) = self.ready_record(&key).await? {
            return Ok(ready);
        }
        Ok(self.generate(asset, spec).await?.thumbnail)
    }

    async fn ready_record(&self, key: &ThumbnailKey) -> Img10Result<Option<Thumbnail>> {
        Ok(self
            .inner
            .index
            .get_thumbnail(key)
            .await?
            .filter(Thumbnail::is_ready))
    }

    /// Fetch the rendition of `hash` described by `spec`, generating it at
    /// most once no matter how many requests arrive together.
    ///
    /// # Errors
    ///
    /// - `UnsupportedSpec` before any lookup when the spec is invalid
    /// - `NotFound` when the asset is unknown or expired
    /// - `DecodeFailure`, `Timeout`, or storage errors from generation
    #[instrument(skip(self, hash, spec), fields(hash = %hash, spec = %spec))]
    pub async fn retrieve(
        &self,
        hash: &ContentHash,
        spec: &ThumbnailSpec,
    ) -> Img10Result<RenditionBytes> {
        spec.validate()?;
        let asset = self.asset(hash).await?;
        let key = ThumbnailKey::new(hash.clone(), spec);

        if let Some(ready) = self.ready_record(&key).await? {
            match self.load_rendition(&ready).await {
                Ok(bytes) => {
                    debug!("Serving stored rendition");
                    return Ok(RenditionBytes {
                        thumbnail: ready,
                        bytes,
                        cache_hit: true,
                    });
                }
                Err(e) if e.category() == ErrorCategory::NotFound => {
                    warn!(error = %e, "Ready rendition missing from storage, regenerating");
                    self.inner.index.remove_thumbnail(&key).await?;
                }
                Err(e) => return Err(e),
            }
        }

        let generated = self.generate(&asset, spec).await?;
        Ok(RenditionBytes {
            thumbnail: generated.thumbnail,
            bytes: generated.bytes,
            cache_hit: !generated.fresh,
        })
    }

    /// Run one generation through the coordinator and record failures.
    async fn generate(&self, asset: &Asset, spec: &ThumbnailSpec) -> Img10Result<Generated> {
        let key = ThumbnailKey::new(asset.hash().clone(), spec);
        let inner = Arc::clone(&self.inner);
        let producer_asset = asset.clone();
        let producer_spec = spec.clone();

        let result = self
            .inner
            .coordinator
            .run(key, move || produce(inner, producer_asset, producer_spec))
            .await;

        if let Err(e) = &result {
            let failed =
                Thumbnail::failed(asset.hash().clone(), spec.clone(), e.to_string(), Utc::now());
            if let Err(index_err) = self.inner.index.record_failed(failed).await {
                warn!(error = %index_err, "Could not record failed rendition");
            }
        }
        result
    }

    async fn load_rendition(&self, thumbnail: &Thumbnail) -> Img10Result<Bytes> {
        load_rendition(&self.inner, thumbnail).await
    }

    /// Current state of the rendition of `hash` described by `spec`.
    ///
    /// A spec that has never been requested reports `Pending`.
    ///
    /// # Errors
    ///
    /// `UnsupportedSpec` for an invalid spec, `NotFound` for an unknown or
    /// expired asset.
    #[instrument(skip(self, hash, spec), fields(hash = %hash, spec = %spec))]
    pub async fn thumbnail_status(
        &self,
        hash: &ContentHash,
        spec: &ThumbnailSpec,
    ) -> Img10Result<ThumbnailStatus> {
        spec.validate()?;
        self.asset(hash).await?;
        let key = ThumbnailKey::new(hash.clone(), spec);

        if self.inner.coordinator.is_pending(&key) {
            return Ok(ThumbnailStatus::Pending);
        }
        Ok(self
            .inner
            .index
            .get_thumbnail(&key)
            .await?
            .map(|thumbnail| *thumbnail.status())
            .unwrap_or(ThumbnailStatus::Pending))
    }

    /// Drop the rendition of `hash` described by `spec` so the next request
    /// regenerates it.
    ///
    /// Returns whether a record existed.
    #[instrument(skip(self, hash, spec), fields(hash = %hash, spec = %spec))]
    pub async fn invalidate(&self, hash: &ContentHash, spec: &ThumbnailSpec) -> Img10Result<bool> {
        let key = ThumbnailKey::new(hash.clone(), spec);
        let Some(removed) = self.inner.index.remove_thumbnail(&key).await? else {
            return Ok(false);
        };
        if let Some(location) = removed.location() {
            delete_quietly(&self.inner, self.inner.thumbnails.as_ref(), location).await;
        }
        info!("Invalidated rendition");
        Ok(true)
    }

    /// Remove every asset older than the retention window, with its
    /// renditions and stored files.
    ///
    /// Returns the number of assets removed; zero when retention is disabled.
    #[instrument(skip(self))]
    pub async fn cleanup_expired(&self, now: DateTime<Utc>) -> Img10Result<usize> {
        if self.inner.config.retention().is_none() {
            debug!("Retention disabled, nothing to clean up");
            return Ok(0);
        }

        let mut removed = 0;
        for asset in self.inner.index.list_assets().await? {
            if self.is_expired(&asset, now) && self.purge(asset.hash()).await? {
                removed += 1;
            }
        }

        info!(removed, "Cleaned up expired assets");
        Ok(removed)
    }

    /// Remove an asset's records, then its files.
    async fn purge(&self, hash: &ContentHash) -> Img10Result<bool> {
        let Some((asset, thumbnails)) = self.inner.index.remove_asset(hash).await? else {
            return Ok(false);
        };

        delete_quietly(&self.inner, self.inner.originals.as_ref(), asset.location()).await;
        for thumbnail in &thumbnails {
            if let Some(location) = thumbnail.location() {
                delete_quietly(&self.inner, self.inner.thumbnails.as_ref(), location).await;
            }
        }

        debug!(hash = %hash, thumbnails = thumbnails.len(), "Purged asset");
        Ok(true)
    }

    fn is_expired(&self, asset: &Asset, now: DateTime<Utc>) -> bool {
        self.inner
            .config
            .retention()
            .is_some_and(|retention| asset.is_expired(now, retention))
    }

    /// Look up a live asset.
    ///
    /// # Errors
    ///
    /// `NotFound` when no asset has this hash or it has expired.
    pub async fn asset(&self, hash: &ContentHash) -> Img10Result<Asset> {
        let asset = self
            .inner
            .index
            .get_asset(hash)
            .await?
            .ok_or_else(|| IngestError::new(IngestErrorKind::AssetNotFound(hash.to_string())))?;
        if self.is_expired(&asset, Utc::now()) {
            return Err(IngestError::new(IngestErrorKind::Expired(hash.to_string())).into());
        }
        Ok(asset)
    }

    /// Rendition records of a live asset.
    pub async fn thumbnails(&self, hash: &ContentHash) -> Img10Result<Vec<Thumbnail>> {
        self.asset(hash).await?;
        self.inner.index.thumbnails_for(hash).await
    }

    /// Stored bytes of a live asset's original upload.
    ///
    /// # Errors
    ///
    /// `NotFound` when the asset is unknown, expired, or its file is gone.
    #[instrument(skip(self, hash), fields(hash = %hash))]
    pub async fn original(&self, hash: &ContentHash) -> Img10Result<Bytes> {
        let asset = self.asset(hash).await?;
        let location = asset.location();
        let bytes = with_retry(self.inner.config.retry(), "load original", || {
            self.inner.originals.get(location)
        })
        .await?;
        debug!(size = bytes.len(), "Serving original");
        Ok(bytes)
    }

    /// Aggregate counters.
    pub async fn stats(&self) -> Img10Result<PipelineStats> {
        Ok(PipelineStats {
            index: self.inner.index.stats().await?,
            originals_bytes: self.inner.originals.usage().await?,
            thumbnails_bytes: self.inner.thumbnails.usage().await?,
            in_flight: self.inner.coordinator.in_flight(),
            generation: self.inner.coordinator.metrics(),
        })
    }

    /// Check that both storage backends and the index respond.
    pub async fn health(&self) -> HealthReport {
        let originals = ComponentHealth::from_result(self.inner.originals.check().await);
        let thumbnails = ComponentHealth::from_result(self.inner.thumbnails.check().await);
        let index = ComponentHealth::from_result(self.inner.index.stats().await);
        let healthy = originals.ok && thumbnails.ok && index.ok;
        if !healthy {
            warn!(?originals, ?thumbnails, ?index, "Health check failed");
        }
        HealthReport {
            healthy,
            originals,
            thumbnails,
            index,
        }
    }
}

/// Generation body run once per ticket.
async fn produce(
    inner: Arc<PipelineInner>,
    asset: Asset,
    spec: ThumbnailSpec,
) -> Img10Result<Generated> {
    let key = ThumbnailKey::new(asset.hash().clone(), &spec);
    let retry = inner.config.retry().clone();

    // A ticket that finished just before this one started may have stored it.
    if let Some(ready) = inner.index.get_thumbnail(&key).await?.filter(Thumbnail::is_ready) {
        let bytes = load_rendition(&inner, &ready).await?;
        return Ok(Generated {
            thumbnail: ready,
            bytes,
            fresh: false,
        });
    }

    let source = with_retry(&retry, "load original", || {
        inner.originals.get(asset.location())
    })
    .await?;
    let actual = ContentHash::of(&source);
    if &actual != asset.hash() {
        return Err(StorageError::new(StorageErrorKind::HashMismatch {
            expected: asset.hash().to_string(),
            actual: actual.to_string(),
        })
        .into());
    }

    let rendition = render_async(
        Arc::clone(&inner.renderer),
        source,
        *asset.media_type(),
        spec.clone(),
    )
    .await?;

    let storage_key = StorageKey::thumbnail(asset.hash(), key.spec(), rendition.format);
    let location = with_retry(&retry, "store rendition", || {
        inner.thumbnails.put(&storage_key, &rendition.bytes)
    })
    .await?;

    let thumbnail = Thumbnail::ready(
        asset.hash().clone(),
        spec,
        location,
        rendition.width,
        rendition.height,
        Utc::now(),
    );
    inner.index.record_ready(thumbnail.clone()).await?;

    info!(
        key = %key,
        width = rendition.width,
        height = rendition.height,
        size = rendition.bytes.len(),
        "Generated rendition"
    );
    Ok(Generated {
        thumbnail,
        bytes: rendition.bytes,
        fresh: true,
    })
}

async fn load_rendition(inner: &PipelineInner, thumbnail: &Thumbnail) -> Img10Result<Bytes> {
    let location = thumbnail.location().as_ref().ok_or_else(|| {
        StorageError::new(StorageErrorKind::Index(format!(
            "ready rendition {} has no location",
            thumbnail.key()
        )))
    })?;
    with_retry(inner.config.retry(), "load rendition", || {
        inner.thumbnails.get(location)
    })
    .await
}

/// Delete a stored object, logging rather than failing.
///
/// Index records are already gone when this runs, so a leftover file only
/// costs space.
async fn delete_quietly(
    inner: &PipelineInner,
    storage: &dyn MediaStorage,
    location: &StorageLocation,
) {
    let result =
        with_retry(inner.config.retry(), "delete object", || storage.delete(location)).await;
    match result {
        Ok(()) => {}
        Err(e) if e.category() == ErrorCategory::NotFound => {
            debug!(location = %location, "Object already gone");
        }
        Err(e) => warn!(location = %location, error = %e, "Could not delete object"),
    }
}
