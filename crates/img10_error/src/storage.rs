//! Storage error types.

/// Kinds of storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Failed to create storage directory
    #[display("Failed to create storage directory: {}", _0)]
    DirectoryCreation(String),
    /// Object not found at the specified location
    #[display("Object not found: {}", _0)]
    NotFound(String),
    /// Location escapes the storage root or is malformed
    #[display("Invalid storage path: {}", _0)]
    InvalidPath(String),
    /// Permission denied when accessing storage
    #[display("Permission denied: {}", _0)]
    PermissionDenied(String),
    /// Stored bytes no longer match their content hash
    #[display("Hash mismatch: expected {}, got {}", expected, actual)]
    HashMismatch {
        /// Hash recorded at write time
        expected: String,
        /// Hash of the bytes actually read
        actual: String,
    },
    /// Backend is temporarily unreachable; the operation may be retried
    #[display("Storage unavailable: {}", _0)]
    Unavailable(String),
    /// Write would exceed the configured quota or the device is full
    #[display("Quota exceeded: {}", _0)]
    QuotaExceeded(String),
    /// Metadata index could not be read or committed
    #[display("Metadata index error: {}", _0)]
    Index(String),
}

impl StorageErrorKind {
    /// Whether the failed operation may succeed if attempted again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageErrorKind::Unavailable(_))
    }
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use img10_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::NotFound("ab/cd/abcd.png".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Map an IO error from a write path onto the storage taxonomy.
    ///
    /// Full devices and exceeded disk quotas are fatal for the request, while
    /// interrupted or timed-out operations are transient.
    #[track_caller]
    pub fn from_io(context: impl std::fmt::Display, err: &std::io::Error) -> Self {
        // ENOSPC, EDQUOT
        const NO_SPACE: i32 = 28;
        const DISK_QUOTA: i32 = 122;

        let message = format!("{}: {}", context, err);
        let kind = match err.raw_os_error() {
            Some(NO_SPACE) | Some(DISK_QUOTA) => StorageErrorKind::QuotaExceeded(message),
            _ => match err.kind() {
                std::io::ErrorKind::NotFound => StorageErrorKind::NotFound(message),
                std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied(message),
                _ => StorageErrorKind::Unavailable(message),
            },
        };
        Self::new(kind)
    }

    /// Whether the failed operation may succeed if attempted again.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}
