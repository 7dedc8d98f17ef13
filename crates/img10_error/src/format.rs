//! Format rejection errors raised after content sniffing.

/// Why an upload's format was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum FormatErrorKind {
    /// No signature matcher recognized the bytes
    #[display("content does not match any known media signature")]
    Unrecognized,
    /// The bytes were recognized but the type is not on the allow-list
    #[display("media type {} is not allowed", _0)]
    NotAllowed(String),
    /// The signature matched but the header could not be parsed
    #[display("{} header is unreadable: {}", _0, _1)]
    Unreadable(String, String),
}

/// Unsupported format error with location tracking.
///
/// # Examples
///
/// ```
/// use img10_error::{FormatError, FormatErrorKind};
///
/// let err = FormatError::new(FormatErrorKind::NotAllowed("image/gif".to_string()));
/// assert!(format!("{}", err).contains("image/gif"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Unsupported Format: {} at line {} in {}", kind, line, file)]
pub struct FormatError {
    /// The kind of error that occurred
    pub kind: FormatErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl FormatError {
    /// Create a new format error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: FormatErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
