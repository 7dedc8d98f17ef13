//! Thumbnail generation error types.

use std::time::Duration;

/// Thumbnail generation error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ThumbnailErrorKind {
    /// Source payload is corrupt or cannot be decoded; never retried
    #[display("Failed to decode source: {}", _0)]
    DecodeFailure(String),
    /// Requested rendition is invalid; rejected before any decode
    #[display("Unsupported thumbnail spec: {}", _0)]
    UnsupportedSpec(String),
    /// Encoding the rendition failed
    #[display("Failed to encode rendition: {}", _0)]
    Encode(String),
    /// Generation did not finish within its deadline
    #[display("Generation timed out after {}ms", _0.as_millis())]
    Timeout(Duration),
    /// The generation task panicked or was torn down
    #[display("Generation task failed: {}", _0)]
    TaskFailed(String),
}

/// Thumbnail error with source location tracking.
///
/// # Examples
///
/// ```
/// use img10_error::{ThumbnailError, ThumbnailErrorKind};
///
/// let err = ThumbnailError::new(ThumbnailErrorKind::UnsupportedSpec("width is 0".into()));
/// assert!(format!("{}", err).contains("width is 0"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Thumbnail Error: {} at line {} in {}", kind, line, file)]
pub struct ThumbnailError {
    /// The kind of error that occurred
    pub kind: ThumbnailErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ThumbnailError {
    /// Create a new ThumbnailError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ThumbnailErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
