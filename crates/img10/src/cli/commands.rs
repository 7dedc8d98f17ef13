//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use img10::{ContentHash, ThumbnailSpec};
use std::path::PathBuf;

/// img10 - upload ingestion with deduplicated thumbnail generation
#[derive(Parser, Debug)]
#[command(name = "img10")]
#[command(about = "Upload ingestion with deduplicated thumbnail generation", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file layered over the defaults
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a file and derive its renditions
    Ingest {
        /// File to upload
        file: PathBuf,

        /// Rendition to derive as WxH[:fit[:format[:qN]]]; repeatable
        #[arg(long = "spec")]
        specs: Vec<ThumbnailSpec>,

        /// Content type claimed for the file
        #[arg(long)]
        declared: Option<String>,
    },

    /// Fetch a rendition, generating it when missing
    Thumbnail {
        /// Content hash of the asset
        hash: ContentHash,

        /// Rendition as WxH[:fit[:format[:qN]]]
        spec: ThumbnailSpec,

        /// Write the encoded rendition to this file
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Fetch the original upload of a live asset
    Original {
        /// Content hash of the asset
        hash: ContentHash,

        /// Write the original bytes to this file
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show the state of a rendition
    Status {
        /// Content hash of the asset
        hash: ContentHash,

        /// Rendition as WxH[:fit[:format[:qN]]]
        spec: ThumbnailSpec,
    },

    /// Drop a rendition so the next request regenerates it
    Invalidate {
        /// Content hash of the asset
        hash: ContentHash,

        /// Rendition as WxH[:fit[:format[:qN]]]
        spec: ThumbnailSpec,
    },

    /// Show an asset and its renditions
    Show {
        /// Content hash of the asset
        hash: ContentHash,
    },

    /// Show storage, index and generation counters
    Stats,

    /// Remove assets older than the retention window
    Cleanup,

    /// Check that storage and the index are reachable
    Health,
}

/// Log line format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}
