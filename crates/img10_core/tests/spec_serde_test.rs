//! Tests for spec and record serialization as used by config files and the index.

use img10_core::{
    ContentHash, FitMode, OutputFormat, StorageLocation, Thumbnail, ThumbnailSpec,
    ThumbnailStatus,
};

#[derive(serde::Deserialize)]
struct Specs {
    specs: Vec<ThumbnailSpec>,
}

#[test]
fn test_spec_from_toml_uses_defaults() {
    let parsed: Specs = toml::from_str(
        r#"
        [[specs]]
        width = 200
        height = 200

        [[specs]]
        width = 640
        height = 480
        fit = "crop"
        format = "webp"
        quality = 60
        "#,
    )
    .unwrap();

    assert_eq!(
        parsed.specs[0],
        ThumbnailSpec::new(200, 200, FitMode::Contain, OutputFormat::Jpeg)
    );
    assert_eq!(
        parsed.specs[1],
        ThumbnailSpec::new(640, 480, FitMode::Crop, OutputFormat::Webp).with_quality(60)
    );
}

#[test]
fn test_thumbnail_record_json() {
    let asset = ContentHash::of(b"original");
    let spec = ThumbnailSpec::new(200, 200, FitMode::Crop, OutputFormat::Jpeg);
    let ready = Thumbnail::ready(
        asset.clone(),
        spec.clone(),
        StorageLocation::new("aa/bb/x/y.jpg"),
        200,
        200,
        chrono::Utc::now(),
    );

    let json = serde_json::to_string(&ready).unwrap();
    let back: Thumbnail = serde_json::from_str(&json).unwrap();
    assert_eq!(back, ready);
    assert_eq!(*back.status(), ThumbnailStatus::Ready);
    assert_eq!(back.key().asset(), &asset);
    assert_eq!(back.key().spec(), &spec.spec_hash());

    let failed = Thumbnail::failed(asset, spec, "decode failure", chrono::Utc::now());
    assert!(!failed.is_ready());
    assert_eq!(failed.error().as_deref(), Some("decode failure"));
    assert!(failed.location().is_none());
}
