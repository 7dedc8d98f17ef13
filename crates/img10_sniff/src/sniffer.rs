//! Ordered matcher chain and allow-list policy.

use crate::{Confidence, Matcher, builtin_matchers};
use img10_core::MediaType;
use img10_error::{FormatError, FormatErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Number of leading bytes handed to matchers.
pub const SNIFF_WINDOW: usize = 64;

/// Outcome of sniffing a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sniffed {
    /// A matcher claimed the payload
    Recognized {
        /// Detected media type
        media_type: MediaType,
        /// How sure the matcher is
        confidence: Confidence,
        /// Name of the matcher that claimed it
        matcher: &'static str,
    },
    /// No matcher claimed the payload
    Unrecognized,
}

impl Sniffed {
    /// Detected media type, if any.
    pub fn media_type(&self) -> Option<MediaType> {
        match self {
            Sniffed::Recognized { media_type, .. } => Some(*media_type),
            Sniffed::Unrecognized => None,
        }
    }
}

/// Media types accepted for ingestion.
///
/// Defaults to JPEG and PNG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowList(BTreeSet<MediaType>);

impl AllowList {
    /// Allow exactly `types`.
    pub fn new(types: impl IntoIterator<Item = MediaType>) -> Self {
        Self(types.into_iter().collect())
    }

    /// Whether `media_type` is accepted.
    pub fn allows(&self, media_type: MediaType) -> bool {
        self.0.contains(&media_type)
    }

    /// Accepted types in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = MediaType> + '_ {
        self.0.iter().copied()
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new([MediaType::Jpeg, MediaType::Png])
    }
}

impl FromIterator<MediaType> for AllowList {
    fn from_iter<I: IntoIterator<Item = MediaType>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Content-based media type detection.
///
/// Runs an ordered chain of [`Matcher`]s over the first [`SNIFF_WINDOW`]
/// bytes; the first matcher to claim the prefix wins. Filenames and
/// client-declared types are never consulted.
///
/// # Examples
///
/// ```
/// use img10_core::MediaType;
/// use img10_sniff::{AllowList, Sniffer};
///
/// let sniffer = Sniffer::default();
/// let gif = b"GIF89a\x01\x00\x01\x00\x00\x00\x00";
///
/// assert_eq!(sniffer.sniff(gif).media_type(), Some(MediaType::Gif));
/// assert!(sniffer.classify(gif, &AllowList::default()).is_err());
/// ```
pub struct Sniffer {
    matchers: Vec<Box<dyn Matcher>>,
}

impl Default for Sniffer {
    fn default() -> Self {
        Self::new(builtin_matchers())
    }
}

impl Sniffer {
    /// Build a sniffer from an explicit chain.
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }

    /// Append a matcher to the end of the chain.
    pub fn with_matcher(mut self, matcher: impl Matcher + 'static) -> Self {
        self.matchers.push(Box::new(matcher));
        self
    }

    /// Names of the matchers in chain order.
    pub fn matcher_names(&self) -> Vec<&'static str> {
        self.matchers.iter().map(|m| m.name()).collect()
    }

    /// Classify `bytes` by content.
    pub fn sniff(&self, bytes: &[u8]) -> Sniffed {
        let prefix = &bytes[..bytes.len().min(SNIFF_WINDOW)];
        self.matchers
            .iter()
            .find_map(|matcher| {
                matcher
                    .inspect(prefix)
                    .map(|confidence| Sniffed::Recognized {
                        media_type: matcher.media_type(),
                        confidence,
                        matcher: matcher.name(),
                    })
            })
            .unwrap_or(Sniffed::Unrecognized)
    }

    /// Sniff and apply the allow-list.
    ///
    /// A [`Confidence::Low`] match is a signature with nothing after it and
    /// counts as unrecognized.
    ///
    /// # Errors
    ///
    /// `Unrecognized` when no matcher claims the payload or the header is
    /// truncated, `NotAllowed` when the detected type is outside `allow`.
    #[track_caller]
    pub fn classify(&self, bytes: &[u8], allow: &AllowList) -> Result<MediaType, FormatError> {
        match self.sniff(bytes) {
            Sniffed::Unrecognized => {
                tracing::debug!(size = bytes.len(), "No matcher recognized payload");
                Err(FormatError::new(FormatErrorKind::Unrecognized))
            }
            Sniffed::Recognized {
                media_type,
                confidence: Confidence::Low,
                matcher,
            } => {
                tracing::debug!(%media_type, matcher, size = bytes.len(), "Header is truncated");
                Err(FormatError::new(FormatErrorKind::Unrecognized))
            }
            Sniffed::Recognized {
                media_type,
                confidence,
                matcher,
            } => {
                tracing::debug!(%media_type, %confidence, matcher, "Sniffed payload");
                if allow.allows(media_type) {
                    Ok(media_type)
                } else {
                    Err(FormatError::new(FormatErrorKind::NotAllowed(
                        media_type.to_string(),
                    )))
                }
            }
        }
    }

    /// [`classify`](Self::classify), noting when the client's declared type disagrees.
    ///
    /// The declared type never influences the result.
    #[track_caller]
    pub fn classify_declared(
        &self,
        bytes: &[u8],
        declared: Option<&str>,
        allow: &AllowList,
    ) -> Result<MediaType, FormatError> {
        let result = self.classify(bytes, allow);
        if let Some(declared) = declared {
            let claimed = declared.parse::<MediaType>().ok();
            let sniffed = match &result {
                Ok(media_type) => Some(*media_type),
                Err(_) => self.sniff(bytes).media_type(),
            };
            if claimed != sniffed {
                tracing::warn!(
                    declared,
                    sniffed = sniffed.map(|m| m.mime()).unwrap_or("unrecognized"),
                    "Declared content type disagrees with content"
                );
            }
        }
        result
    }
}
