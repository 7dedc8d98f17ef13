//! Ingestion pipeline for img10.
//!
//! [`IngestionPipeline`] wires the other crates together:
//!
//! ```text
//! ingest:   sniff -> validate -> hash -> dedup -> store original -> index -> derive
//! retrieve: validate spec -> index lookup -> stored rendition | coordinator -> render -> store
//! ```
//!
//! Every storage call is retried with exponential backoff while it fails
//! with a transient error. Configuration comes from [`PipelineConfig`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod pipeline;
mod retry;

pub use config::{
    DerivationMode, PipelineConfig, PipelineConfigBuilder, PipelineConfigBuilderError,
    RetryConfig, StorageConfig,
};
pub use pipeline::{
    ComponentHealth, HealthReport, IngestOutcome, IngestRequest, IngestionPipeline,
    PipelineStats, RenditionBytes, RenditionReport,
};
