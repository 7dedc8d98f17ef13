//! Flat error taxonomy surfaced to external callers.

use crate::{FormatErrorKind, Img10ErrorKind, IngestErrorKind, StorageErrorKind, ThumbnailErrorKind};

/// Coarse classification of an [`Img10Error`](crate::Img10Error).
///
/// External interfaces map these onto their own status codes; the six
/// pipeline categories come first, followed by validation and lookup ones.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::EnumIter,
    strum::IntoStaticStr,
    derive_more::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    /// Sniffed type is unknown or not allowed
    #[display("unsupported_format")]
    UnsupportedFormat,
    /// Source could not be decoded or rendition encoded
    #[display("decode_failure")]
    DecodeFailure,
    /// Requested spec is invalid
    #[display("unsupported_spec")]
    UnsupportedSpec,
    /// Transient storage failure
    #[display("storage_unavailable")]
    StorageUnavailable,
    /// Storage quota or device capacity exhausted
    #[display("quota_exceeded")]
    QuotaExceeded,
    /// Generation exceeded its deadline
    #[display("timeout")]
    Timeout,
    /// Upload rejected by size or emptiness checks
    #[display("invalid_upload")]
    InvalidUpload,
    /// Asset or stored object does not exist (or has expired)
    #[display("not_found")]
    NotFound,
    /// Misconfiguration, corrupted state or internal failure
    #[display("internal")]
    Internal,
}

impl ErrorCategory {
    pub(crate) fn of(kind: &Img10ErrorKind) -> Self {
        match kind {
            Img10ErrorKind::Format(e) => match e.kind {
                FormatErrorKind::Unrecognized
                | FormatErrorKind::NotAllowed(_)
                | FormatErrorKind::Unreadable(..) => ErrorCategory::UnsupportedFormat,
            },
            Img10ErrorKind::Thumbnail(e) => match e.kind {
                ThumbnailErrorKind::DecodeFailure(_) | ThumbnailErrorKind::Encode(_) => {
                    ErrorCategory::DecodeFailure
                }
                ThumbnailErrorKind::UnsupportedSpec(_) => ErrorCategory::UnsupportedSpec,
                ThumbnailErrorKind::Timeout(_) => ErrorCategory::Timeout,
                ThumbnailErrorKind::TaskFailed(_) => ErrorCategory::Internal,
            },
            Img10ErrorKind::Storage(e) => match e.kind {
                StorageErrorKind::Unavailable(_) => ErrorCategory::StorageUnavailable,
                StorageErrorKind::QuotaExceeded(_) => ErrorCategory::QuotaExceeded,
                StorageErrorKind::NotFound(_) => ErrorCategory::NotFound,
                StorageErrorKind::DirectoryCreation(_)
                | StorageErrorKind::InvalidPath(_)
                | StorageErrorKind::PermissionDenied(_)
                | StorageErrorKind::HashMismatch { .. }
                | StorageErrorKind::Index(_) => ErrorCategory::Internal,
            },
            Img10ErrorKind::Ingest(e) => match e.kind {
                IngestErrorKind::Empty | IngestErrorKind::TooLarge { .. } => {
                    ErrorCategory::InvalidUpload
                }
                IngestErrorKind::AssetNotFound(_) | IngestErrorKind::Expired(_) => {
                    ErrorCategory::NotFound
                }
            },
            Img10ErrorKind::Config(_) => ErrorCategory::Internal,
        }
    }

    /// Whether this category is worth retrying from the caller's side.
    pub fn is_transient(self) -> bool {
        matches!(self, ErrorCategory::StorageUnavailable)
    }
}
