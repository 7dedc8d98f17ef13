//! Ingestion and lookup error types.

/// Ingestion and lookup error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum IngestErrorKind {
    /// Upload carried no bytes
    #[display("Upload is empty")]
    Empty,
    /// Upload exceeds the configured size ceiling
    #[display("File size too large: {} bytes exceeds maximum of {} bytes", size, max)]
    TooLarge {
        /// Size of the rejected upload
        size: u64,
        /// Configured ceiling
        max: u64,
    },
    /// No asset is indexed under the given hash
    #[display("Asset not found: {}", _0)]
    AssetNotFound(String),
    /// Asset exists but is past its retention window
    #[display("Asset has expired: {}", _0)]
    Expired(String),
}

/// Ingestion error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Ingest Error: {} at line {} in {}", kind, line, file)]
pub struct IngestError {
    /// The kind of error that occurred
    pub kind: IngestErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl IngestError {
    /// Create a new ingest error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: IngestErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
