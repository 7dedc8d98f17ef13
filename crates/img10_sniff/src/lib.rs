//! Content-based media type detection for img10.
//!
//! Uploads are classified by their leading bytes, never by filename or the
//! client's declared content type. A [`Sniffer`] runs an ordered chain of
//! [`Matcher`]s; an [`AllowList`] then decides whether the detected type may
//! be ingested.
//!
//! Sniffing itself never fails. Truncated or corrupt headers produce
//! [`Sniffed::Unrecognized`] and the caller applies its rejection policy.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod matcher;
mod sniffer;

pub use matcher::{
    BmpMatcher, Confidence, GifMatcher, JpegMatcher, Matcher, Mp4Matcher, PngMatcher, TiffMatcher,
    WebmMatcher, WebpMatcher, builtin_matchers,
};
pub use sniffer::{AllowList, SNIFF_WINDOW, Sniffed, Sniffer};
