//! img10 - upload ingestion and thumbnail generation.
//!
//! img10 accepts untrusted uploads, classifies them by content rather than by
//! declared type, stores each distinct original once under its SHA-256 hash,
//! and derives resized renditions on demand. Concurrent requests for the same
//! rendition share a single generation.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use img10::{ContentHash, IngestRequest, IngestionPipeline, PipelineConfig, ThumbnailSpec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::load(None)?;
//!     let pipeline = IngestionPipeline::from_config(config).await?;
//!
//!     let bytes = tokio::fs::read("photo.jpg").await?;
//!     let outcome = pipeline.ingest(IngestRequest::new(bytes)).await?;
//!
//!     let spec: ThumbnailSpec = "200x200:crop:jpeg".parse()?;
//!     let rendition = pipeline.retrieve(outcome.asset.hash(), &spec).await?;
//!     println!("{} bytes", rendition.bytes.len());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `img10-error` - Error types and the public error taxonomy
//! - `img10-core` - Hashes, media types, specs, assets and thumbnails
//! - `img10-storage` - Content-addressed storage gateway and metadata index
//! - `img10-sniff` - Magic-byte format detection
//! - `img10-thumbnail` - Resize, crop, pad and encode
//! - `img10-cache` - Single-flight generation coordinator
//! - `img10-pipeline` - Ingestion and retrieval orchestration
//!
//! This crate (`img10`) re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use img10_cache::*;
pub use img10_core::*;
pub use img10_error::*;
pub use img10_pipeline::*;
pub use img10_sniff::*;
pub use img10_storage::*;
pub use img10_thumbnail::*;

pub mod observability;
