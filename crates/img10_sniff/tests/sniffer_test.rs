//! Tests for the sniffer chain and allow-list policy.

use img10_core::MediaType;
use img10_error::{ErrorCategory, FormatErrorKind, Img10Error};
use img10_sniff::{AllowList, Confidence, Matcher, SNIFF_WINDOW, Sniffed, Sniffer};

fn png_header() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0, 0, 0, 13]);
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 1, 8, 6, 0, 0, 0]);
    bytes
}

fn samples() -> Vec<(MediaType, Vec<u8>)> {
    let mut webp = b"RIFF\x24\x00\x00\x00WEBPVP8L".to_vec();
    webp.extend_from_slice(&[0; 8]);
    let mut bmp = vec![b'B', b'M', 0x3A, 0, 0, 0, 0, 0, 0, 0, 0x36, 0, 0, 0];
    bmp.extend_from_slice(&40u32.to_le_bytes());
    let mut mp4 = vec![0, 0, 0, 0x20];
    mp4.extend_from_slice(b"ftypmp42\0\0\0\0mp42isom");
    let mut webm = vec![0x1A, 0x45, 0xDF, 0xA3, 0x9F, 0x42, 0x86, 0x81, 0x01, 0x42, 0x82, 0x84];
    webm.extend_from_slice(b"webm");

    vec![
        (MediaType::Png, png_header()),
        (
            MediaType::Jpeg,
            vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00],
        ),
        (MediaType::Gif, b"GIF87a\x20\x00\x10\x00\x80\x00\x00".to_vec()),
        (MediaType::Webp, webp),
        (MediaType::Bmp, bmp),
        (MediaType::Tiff, b"II*\x00\x08\x00\x00\x00".to_vec()),
        (MediaType::Tiff, b"MM\x00*\x00\x00\x00\x08".to_vec()),
        (MediaType::Mp4, mp4),
        (MediaType::Webm, webm),
    ]
}

#[test]
fn test_every_builtin_type_is_recognized_with_high_confidence() {
    let sniffer = Sniffer::default();
    for (expected, bytes) in samples() {
        match sniffer.sniff(&bytes) {
            Sniffed::Recognized {
                media_type,
                confidence,
                ..
            } => {
                assert_eq!(media_type, expected);
                assert_eq!(confidence, Confidence::High, "{}", expected);
            }
            Sniffed::Unrecognized => panic!("{} was not recognized", expected),
        }
    }
}

#[test]
fn test_chain_order() {
    assert_eq!(
        Sniffer::default().matcher_names(),
        vec!["png", "jpeg", "gif", "webp", "bmp", "tiff", "mp4", "webm"]
    );
}

#[test]
fn test_truncated_and_garbage_are_unrecognized() {
    let sniffer = Sniffer::default();
    for bytes in [
        &b""[..],
        &b"\x89PN"[..],
        &b"\xFF\xD8"[..],
        &b"GIF8"[..],
        &b"RIFF\x00\x00\x00\x00AVI "[..],
        &b"hello, this is just text"[..],
        &b"%PDF-1.7\n"[..],
    ] {
        assert_eq!(sniffer.sniff(bytes), Sniffed::Unrecognized, "{:?}", bytes);
    }
}

#[test]
fn test_bare_signature_is_low_confidence() {
    let sniffer = Sniffer::default();
    let sniffed = sniffer.sniff(&[0xFF, 0xD8, 0xFF]);
    assert_eq!(
        sniffed,
        Sniffed::Recognized {
            media_type: MediaType::Jpeg,
            confidence: Confidence::Low,
            matcher: "jpeg",
        }
    );
}

#[test]
fn test_classify_refuses_bare_signatures() {
    let sniffer = Sniffer::default();
    let allow: AllowList = [MediaType::Jpeg, MediaType::Png, MediaType::Bmp]
        .into_iter()
        .collect();

    for bytes in [
        &b"\x89PNG\r\n\x1a\n"[..],
        &b"\xFF\xD8\xFF"[..],
        &b"BM\x00\x00"[..],
    ] {
        let err = sniffer.classify(bytes, &allow).unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::Unrecognized, "{:?}", bytes);
    }

    let err: Img10Error = sniffer
        .classify_declared(&[0xFF, 0xD8, 0xFF], Some("image/jpeg"), &allow)
        .unwrap_err()
        .into();
    assert_eq!(err.category(), ErrorCategory::UnsupportedFormat);
}

#[test]
fn test_only_window_is_inspected() {
    let sniffer = Sniffer::default();
    let mut bytes = vec![0u8; SNIFF_WINDOW];
    bytes.extend_from_slice(&png_header());
    assert_eq!(sniffer.sniff(&bytes), Sniffed::Unrecognized);
}

#[test]
fn test_classify_rejects_types_outside_allow_list() {
    let sniffer = Sniffer::default();
    let allow = AllowList::default();

    assert_eq!(sniffer.classify(&png_header(), &allow).unwrap(), MediaType::Png);

    let gif = b"GIF89a\x01\x00\x01\x00\x00\x00\x00";
    let err = sniffer.classify(gif, &allow).unwrap_err();
    assert_eq!(err.kind, FormatErrorKind::NotAllowed("image/gif".to_string()));

    let widened: AllowList = [MediaType::Gif].into_iter().collect();
    assert_eq!(sniffer.classify(gif, &widened).unwrap(), MediaType::Gif);
}

#[test]
fn test_non_image_declared_as_png_is_unsupported() {
    let sniffer = Sniffer::default();
    let err = sniffer
        .classify_declared(b"not an image at all", Some("image/png"), &AllowList::default())
        .unwrap_err();
    assert_eq!(err.kind, FormatErrorKind::Unrecognized);

    let err: Img10Error = err.into();
    assert_eq!(err.category(), ErrorCategory::UnsupportedFormat);
}

#[test]
fn test_declared_type_is_ignored() {
    let sniffer = Sniffer::default();
    let media_type = sniffer
        .classify_declared(&png_header(), Some("image/jpeg"), &AllowList::default())
        .unwrap();
    assert_eq!(media_type, MediaType::Png);
}

#[test]
fn test_custom_matcher_runs_after_builtins() {
    struct Everything;

    impl Matcher for Everything {
        fn name(&self) -> &'static str {
            "everything"
        }

        fn media_type(&self) -> MediaType {
            MediaType::Bmp
        }

        fn inspect(&self, _prefix: &[u8]) -> Option<Confidence> {
            Some(Confidence::Low)
        }
    }

    let sniffer = Sniffer::default().with_matcher(Everything);
    assert_eq!(sniffer.sniff(&png_header()).media_type(), Some(MediaType::Png));
    match sniffer.sniff(b"plain text") {
        Sniffed::Recognized { matcher, .. } => assert_eq!(matcher, "everything"),
        Sniffed::Unrecognized => panic!("fallback matcher did not run"),
    }
}

#[test]
fn test_allow_list_serde() {
    let allow: AllowList = serde_json::from_str(r#"["png", "jpeg"]"#).unwrap();
    assert_eq!(allow, AllowList::default());
    assert_eq!(
        allow.iter().collect::<Vec<_>>(),
        vec![MediaType::Jpeg, MediaType::Png]
    );
}
