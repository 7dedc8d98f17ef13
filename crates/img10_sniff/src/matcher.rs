//! Byte-signature matchers.
//!
//! Each matcher recognizes one media type from the leading bytes of a
//! payload. A matcher never fails: it either claims the prefix with some
//! [`Confidence`] or passes.

use img10_core::MediaType;

/// How strongly a matcher believes a prefix belongs to its type.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Signature present but the buffer ends right after it
    #[display("low")]
    Low,
    /// Signature present
    #[display("medium")]
    Medium,
    /// Signature plus a consistent structural field
    #[display("high")]
    High,
}

/// A pure byte-signature check for one media type.
pub trait Matcher: Send + Sync {
    /// Name reported in [`Sniffed::Recognized`](crate::Sniffed).
    fn name(&self) -> &'static str;

    /// Media type this matcher recognizes.
    fn media_type(&self) -> MediaType;

    /// Inspect the leading bytes of a payload.
    ///
    /// `prefix` may be shorter than any header; implementations must not
    /// index past its end.
    fn inspect(&self, prefix: &[u8]) -> Option<Confidence>;
}

/// Grade a prefix whose signature occupies `signature_len` bytes.
fn grade(prefix: &[u8], signature_len: usize, structural: impl FnOnce() -> bool) -> Confidence {
    if prefix.len() <= signature_len {
        Confidence::Low
    } else if structural() {
        Confidence::High
    } else {
        Confidence::Medium
    }
}

fn u32_le(bytes: &[u8], at: usize) -> Option<u32> {
    let raw = bytes.get(at..at + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

fn u32_be(bytes: &[u8], at: usize) -> Option<u32> {
    let raw = bytes.get(at..at + 4)?;
    Some(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

fn u16_le(bytes: &[u8], at: usize) -> Option<u16> {
    let raw = bytes.get(at..at + 2)?;
    Some(u16::from_le_bytes([raw[0], raw[1]]))
}

/// PNG: 8-byte signature, first chunk must be `IHDR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngMatcher;

impl PngMatcher {
    const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
}

impl Matcher for PngMatcher {
    fn name(&self) -> &'static str {
        "png"
    }

    fn media_type(&self) -> MediaType {
        MediaType::Png
    }

    fn inspect(&self, prefix: &[u8]) -> Option<Confidence> {
        if !prefix.starts_with(&Self::SIGNATURE) {
            return None;
        }
        Some(grade(prefix, Self::SIGNATURE.len(), || {
            prefix.get(12..16) == Some(b"IHDR".as_slice())
        }))
    }
}

/// JPEG: SOI marker followed by another marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegMatcher;

impl Matcher for JpegMatcher {
    fn name(&self) -> &'static str {
        "jpeg"
    }

    fn media_type(&self) -> MediaType {
        MediaType::Jpeg
    }

    fn inspect(&self, prefix: &[u8]) -> Option<Confidence> {
        if !prefix.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return None;
        }
        // APPn, DQT, DHT, SOFn and COM all live in C0..=FE.
        Some(grade(prefix, 3, || {
            prefix.get(3).is_some_and(|m| (0xC0..=0xFE).contains(m))
        }))
    }
}

/// GIF: `GIF87a`/`GIF89a` followed by the logical screen descriptor.
#[derive(Debug, Clone, Copy, Default)]
pub struct GifMatcher;

impl Matcher for GifMatcher {
    fn name(&self) -> &'static str {
        "gif"
    }

    fn media_type(&self) -> MediaType {
        MediaType::Gif
    }

    fn inspect(&self, prefix: &[u8]) -> Option<Confidence> {
        if !(prefix.starts_with(b"GIF87a") || prefix.starts_with(b"GIF89a")) {
            return None;
        }
        Some(grade(prefix, 6, || {
            matches!(
                (u16_le(prefix, 6), u16_le(prefix, 8)),
                (Some(w), Some(h)) if w > 0 && h > 0
            )
        }))
    }
}

/// WebP: RIFF container with a `WEBP` form type.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebpMatcher;

impl Matcher for WebpMatcher {
    fn name(&self) -> &'static str {
        "webp"
    }

    fn media_type(&self) -> MediaType {
        MediaType::Webp
    }

    fn inspect(&self, prefix: &[u8]) -> Option<Confidence> {
        if !prefix.starts_with(b"RIFF") || prefix.get(8..12) != Some(b"WEBP".as_slice()) {
            return None;
        }
        Some(grade(prefix, 12, || {
            matches!(
                prefix.get(12..16),
                Some(b"VP8 ") | Some(b"VP8L") | Some(b"VP8X")
            )
        }))
    }
}

/// BMP: `BM`, zero reserved words, known DIB header size.
#[derive(Debug, Clone, Copy, Default)]
pub struct BmpMatcher;

impl BmpMatcher {
    const DIB_HEADER_SIZES: [u32; 6] = [12, 40, 52, 56, 108, 124];
}

impl Matcher for BmpMatcher {
    fn name(&self) -> &'static str {
        "bmp"
    }

    fn media_type(&self) -> MediaType {
        MediaType::Bmp
    }

    fn inspect(&self, prefix: &[u8]) -> Option<Confidence> {
        if !prefix.starts_with(b"BM") {
            return None;
        }
        // Two bytes alone are too weak; the reserved words must be zero when present.
        if prefix
            .get(6..10)
            .is_some_and(|reserved| reserved.iter().any(|b| *b != 0))
        {
            return None;
        }
        if prefix.len() < 10 {
            return Some(Confidence::Low);
        }
        Some(grade(prefix, 10, || {
            u32_le(prefix, 14).is_some_and(|size| Self::DIB_HEADER_SIZES.contains(&size))
        }))
    }
}

/// TIFF: byte-order mark, magic 42, first IFD offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiffMatcher;

impl Matcher for TiffMatcher {
    fn name(&self) -> &'static str {
        "tiff"
    }

    fn media_type(&self) -> MediaType {
        MediaType::Tiff
    }

    fn inspect(&self, prefix: &[u8]) -> Option<Confidence> {
        let little = prefix.starts_with(b"II*\0");
        let big = prefix.starts_with(b"MM\0*");
        if !(little || big) {
            return None;
        }
        Some(grade(prefix, 4, || {
            let offset = if little {
                u32_le(prefix, 4)
            } else {
                u32_be(prefix, 4)
            };
            offset.is_some_and(|o| o >= 8)
        }))
    }
}

/// MP4: ISO base media `ftyp` box with a video brand.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mp4Matcher;

impl Mp4Matcher {
    const VIDEO_BRANDS: [&'static [u8; 4]; 10] = [
        b"isom", b"iso2", b"iso4", b"iso5", b"iso6", b"mp41", b"mp42", b"avc1", b"M4V ", b"dash",
    ];
    /// Still-image brands sharing the container (HEIF, AVIF).
    const IMAGE_BRANDS: [&'static [u8; 4]; 6] =
        [b"heic", b"heix", b"mif1", b"msf1", b"avif", b"avis"];
}

impl Matcher for Mp4Matcher {
    fn name(&self) -> &'static str {
        "mp4"
    }

    fn media_type(&self) -> MediaType {
        MediaType::Mp4
    }

    fn inspect(&self, prefix: &[u8]) -> Option<Confidence> {
        if prefix.get(4..8) != Some(b"ftyp".as_slice()) {
            return None;
        }
        let brand = prefix.get(8..12);
        if brand.is_some_and(|b| Self::IMAGE_BRANDS.iter().any(|i| b == i.as_slice())) {
            return None;
        }
        Some(grade(prefix, 8, || {
            brand.is_some_and(|b| Self::VIDEO_BRANDS.iter().any(|v| b == v.as_slice()))
        }))
    }
}

/// WebM: EBML header declaring the `webm` doc type.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebmMatcher;

impl WebmMatcher {
    const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];
}

impl Matcher for WebmMatcher {
    fn name(&self) -> &'static str {
        "webm"
    }

    fn media_type(&self) -> MediaType {
        MediaType::Webm
    }

    fn inspect(&self, prefix: &[u8]) -> Option<Confidence> {
        if !prefix.starts_with(&Self::EBML_MAGIC) {
            return None;
        }
        let contains = |needle: &[u8]| prefix.windows(needle.len()).any(|w| w == needle);
        // Plain Matroska is a different type.
        if contains(b"matroska".as_slice()) {
            return None;
        }
        Some(grade(prefix, Self::EBML_MAGIC.len(), || contains(b"webm".as_slice())))
    }
}

/// Built-in matchers in chain order.
pub fn builtin_matchers() -> Vec<Box<dyn Matcher>> {
    vec![
        Box::new(PngMatcher),
        Box::new(JpegMatcher),
        Box::new(GifMatcher),
        Box::new(WebpMatcher),
        Box::new(BmpMatcher),
        Box::new(TiffMatcher),
        Box::new(Mp4Matcher),
        Box::new(WebmMatcher),
    ]
}
