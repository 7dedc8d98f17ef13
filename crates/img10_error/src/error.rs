//! Top-level error wrapper types.

use crate::{ConfigError, ErrorCategory, FormatError, IngestError, StorageError, ThumbnailError};

/// The foundation error enum aggregating every img10 error.
///
/// # Examples
///
/// ```
/// use img10_error::{Img10Error, StorageError, StorageErrorKind};
///
/// let storage_err = StorageError::new(StorageErrorKind::Unavailable("disk busy".into()));
/// let err: Img10Error = storage_err.into();
/// assert!(format!("{}", err).contains("Storage unavailable"));
/// ```
#[derive(Debug, Clone, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum Img10ErrorKind {
    /// Content sniffing rejected the upload
    #[from(FormatError)]
    Format(FormatError),
    /// Decode, spec validation, or generation deadline failure
    #[from(ThumbnailError)]
    Thumbnail(ThumbnailError),
    /// Storage gateway or metadata index failure
    #[from(StorageError)]
    Storage(StorageError),
    /// Upload validation or asset lookup failure
    #[from(IngestError)]
    Ingest(IngestError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// img10 error with kind discrimination.
///
/// # Examples
///
/// ```
/// use img10_error::{ConfigError, Img10Result};
///
/// fn might_fail() -> Img10Result<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("img10 Error: {}", _0)]
pub struct Img10Error(Box<Img10ErrorKind>);

impl Img10Error {
    /// Create a new error from a kind.
    pub fn new(kind: Img10ErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &Img10ErrorKind {
        &self.0
    }

    /// Classify this error into the pipeline's public taxonomy.
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::of(self.kind())
    }

    /// Whether the failed operation may succeed if attempted again.
    pub fn is_retryable(&self) -> bool {
        match self.kind() {
            Img10ErrorKind::Storage(e) => e.is_retryable(),
            _ => false,
        }
    }
}

// Generic From implementation for any type that converts to Img10ErrorKind
impl<T> From<T> for Img10Error
where
    T: Into<Img10ErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for img10 operations.
pub type Img10Result<T> = std::result::Result<T, Img10Error>;
