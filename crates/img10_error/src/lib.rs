//! Error types for the img10 pipeline.
//!
//! This crate provides the foundation error types used throughout the img10 workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! Every error is `Clone`, so a single generation outcome can be handed to
//! every request waiting on it.
//!
//! # Examples
//!
//! ```
//! use img10_error::{ErrorCategory, FormatError, FormatErrorKind, Img10Result};
//!
//! fn sniff() -> Img10Result<()> {
//!     Err(FormatError::new(FormatErrorKind::Unrecognized))?
//! }
//!
//! let err = sniff().unwrap_err();
//! assert_eq!(err.category(), ErrorCategory::UnsupportedFormat);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod category;
mod config;
mod error;
mod format;
mod ingest;
mod storage;
mod thumbnail;

pub use category::ErrorCategory;
pub use config::ConfigError;
pub use error::{Img10Error, Img10ErrorKind, Img10Result};
pub use format::{FormatError, FormatErrorKind};
pub use ingest::{IngestError, IngestErrorKind};
pub use storage::{StorageError, StorageErrorKind};
pub use thumbnail::{ThumbnailError, ThumbnailErrorKind};
