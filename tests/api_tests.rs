//! End-to-end tests for the HTTP retrieval surface.
//!
//! Each test drives the router directly with `tower::ServiceExt::oneshot`
//! over a temp-dir backend tree populated with synthetic fixtures.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use digcoll_retriever::config::Config;
use digcoll_retriever::server::{AppState, create_router};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;

const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n<< >>\n%%EOF\n";
const DC_XML: &[u8] = b"<?xml version=\"1.0\"?><metadata><dc:title>Test Volume</dc:title></metadata>";
const ALTO_XML: &[u8] = b"<?xml version=\"1.0\"?><alto><Layout/></alto>";

/// Write a small gradient image; the extension picks the encoder.
fn write_image(path: &Path, width: u32, height: u32) {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    image::DynamicImage::ImageRgb8(img).save(path).unwrap();
}

/// A fully populated backend tree:
/// - mvol unit 0001/0002/0003 with a 120x80 page tif, pdf, dc.xml, and ALTO
/// - a flat tif dir with a 64x48 `page12.tif`
/// - a flat jpg dir with a 50x40 `page12.jpg`
struct Fixtures {
    _tmp: TempDir,
    config: Config,
}

impl Fixtures {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();

        let unit = tmp
            .path()
            .join("oc/data/ldr_oc_admin/files/Preservation Unit/mvol/0001/0002/0003");
        fs::create_dir_all(unit.join("TIFF")).unwrap();
        fs::create_dir_all(unit.join("ALTO")).unwrap();
        write_image(&unit.join("TIFF/mvol-0001-0002-0003_0001.tif"), 120, 80);
        fs::write(unit.join("mvol-0001-0002-0003.pdf"), PDF_BYTES).unwrap();
        fs::write(unit.join("mvol-0001-0002-0003.dc.xml"), DC_XML).unwrap();
        fs::write(unit.join("ALTO/mvol-0001-0002-0003_0001.xml"), ALTO_XML).unwrap();

        let flat_tifs = tmp.path().join("flat-tifs");
        fs::create_dir_all(&flat_tifs).unwrap();
        write_image(&flat_tifs.join("page12.tif"), 64, 48);

        let flat_jpgs = tmp.path().join("flat-jpgs");
        fs::create_dir_all(&flat_jpgs).unwrap();
        write_image(&flat_jpgs.join("page12.jpg"), 50, 40);

        let mut config = Config::empty();
        config.flat_tif_dir_root = Some(flat_tifs);
        config.flat_jpg_dir_root = Some(flat_jpgs);
        config.mvol.owncloud_root = Some(tmp.path().join("oc"));
        config.mvol.owncloud_user = Some("ldr_oc_admin".to_string());
        config.mvol.owncloud_subpath = Some("Preservation Unit".to_string());

        Self { _tmp: tmp, config }
    }

    /// Borrowing: the `TempDir` must outlive the router's requests.
    fn router(&self) -> Router {
        create_router(AppState::new(self.config.clone()))
    }
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    (status, content_type, bytes)
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, _, bytes) = get(router, uri).await;
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn root_reports_liveness() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();
    let (status, json) = get_json(&router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "Not broken!");
}

#[tokio::test]
async fn version_matches_the_package() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();
    let (status, json) = get_json(&router, "/version").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn stat_lists_issue_level_contexts() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();
    let (status, json) = get_json(&router, "/mvol-0001-0002-0003/stat").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["identifier"], "mvol-0001-0002-0003");
    let contexts: Vec<&str> = json["contexts_available"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(contexts.contains(&"/mvol-0001-0002-0003/pdf"));
    assert!(contexts.contains(&"/mvol-0001-0002-0003/metadata"));
}

#[tokio::test]
async fn tif_with_width_resizes_and_defaults_height_to_original() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();
    let (status, content_type, bytes) =
        get(&router, "/mvol-0001-0002-0003_0001/tif?width=200").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/tif"));
    let img = image::load_from_memory(&bytes).unwrap();
    // Width as requested; the missing height fills with the original's 80.
    assert_eq!((img.width(), img.height()), (200, 80));
}

#[tokio::test]
async fn untransformed_tif_is_served_whole() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();
    let (status, _, bytes) = get(&router, "/mvol-0001-0002-0003_0001/tif").await;
    assert_eq!(status, StatusCode::OK);
    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (120, 80));
}

#[tokio::test]
async fn jpg_is_derived_from_the_page_tif() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();
    let (status, content_type, bytes) = get(&router, "/mvol-0001-0002-0003_0001/jpg").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/jpg"));
    assert_eq!(
        image::guess_format(&bytes).unwrap(),
        image::ImageFormat::Jpeg
    );
}

#[tokio::test]
async fn pdf_is_served_verbatim() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();
    let (status, content_type, bytes) = get(&router, "/mvol-0001-0002-0003/pdf").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/pdf"));
    assert_eq!(bytes, PDF_BYTES);
}

#[tokio::test]
async fn descriptive_metadata_is_served_as_xml() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();
    let (status, content_type, bytes) = get(&router, "/mvol-0001-0002-0003/metadata").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/xml"));
    assert_eq!(bytes, DC_XML);
}

#[tokio::test]
async fn limb_ocr_round_trips() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();
    let (status, content_type, bytes) = get(&router, "/mvol-0001-0002-0003_0001/ocr/limb").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/xml"));
    assert_eq!(bytes, ALTO_XML);
}

#[tokio::test]
async fn unknown_ocr_variant_is_unsupported() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();
    let (status, json) = get_json(&router, "/mvol-0001-0002-0003_0001/ocr/tesseract").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error_name"], "UnsupportedContextError");
}

#[tokio::test]
async fn tif_technical_metadata_reports_dimensions() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();
    let (status, json) = get_json(&router, "/mvol-0001-0002-0003_0001/tif/technical_metadata").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["width"], 120);
    assert_eq!(json["height"], 80);
}

#[tokio::test]
async fn jpg_technical_metadata_reports_dimensions() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();
    let (status, json) = get_json(&router, "/flatjpgdir-page12/jpg/technical_metadata").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["width"], 50);
    assert_eq!(json["height"], 40);
}

#[tokio::test]
async fn unknown_identifier_yields_a_structured_error() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();
    for uri in ["/bogus-123/tif", "/bogus-123/stat", "/bogus-123/pdf"] {
        let (status, json) = get_json(&router, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(json["error_name"], "UnknownIdentifierFormatError", "{uri}");
        assert!(json["message"].as_str().unwrap().contains("bogus-123"));
    }
}

#[tokio::test]
async fn scale_with_width_is_mutually_exclusive() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();
    let (status, json) = get_json(
        &router,
        "/mvol-0001-0002-0003_0001/jpg?scale=0.5&width=100",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_name"], "MutuallyExclusiveParametersError");
}

#[tokio::test]
async fn partial_crop_is_rejected() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();
    let (status, json) = get_json(
        &router,
        "/mvol-0001-0002-0003_0001/jpg?cropstartx=0&cropstarty=0&cropendx=50",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_name"], "InvalidCropParametersError");
}

#[tokio::test]
async fn crop_is_applied_after_resize() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();
    let (status, _, bytes) = get(
        &router,
        "/mvol-0001-0002-0003_0001/jpg?width=60&height=40&cropstartx=10&cropstarty=10&cropendx=40&cropendy=30",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (30, 20));
}

#[tokio::test]
async fn scale_resizes_both_axes() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();
    let (status, _, bytes) = get(&router, "/mvol-0001-0002-0003_0001/jpg?scale=0.5").await;
    assert_eq!(status, StatusCode::OK);
    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (60, 40));
}

#[tokio::test]
async fn oversized_dimensions_are_capped_at_twice_the_original() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();
    let (status, _, bytes) = get(&router, "/mvol-0001-0002-0003_0001/jpg?width=9999&height=9999").await;
    assert_eq!(status, StatusCode::OK);
    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (240, 160));
}

#[tokio::test]
async fn thumbnail_requires_width_and_height() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();
    let (status, json) = get_json(&router, "/mvol-0001-0002-0003_0001/jpg/thumb?width=50").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_name"], "MissingParameterError");
}

#[tokio::test]
async fn thumbnail_fits_within_the_box_preserving_aspect() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();
    let (status, _, bytes) = get(
        &router,
        "/mvol-0001-0002-0003_0001/jpg/thumb?width=60&height=60",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let img = image::load_from_memory(&bytes).unwrap();
    // 120x80 fit into 60x60 preserves the 3:2 aspect.
    assert_eq!((img.width(), img.height()), (60, 40));
}

#[tokio::test]
async fn flat_tif_family_serves_jpg_by_derivation() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();
    let (status, _, bytes) = get(&router, "/flattifdir-page12/jpg").await;
    assert_eq!(status, StatusCode::OK);
    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (64, 48));
}

#[tokio::test]
async fn stat_advertises_jpg_for_a_tif_only_family() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();
    let (status, json) = get_json(&router, "/flattifdir-page12/stat").await;
    assert_eq!(status, StatusCode::OK);
    let contexts: Vec<&str> = json["contexts_available"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(contexts.contains(&"/flattifdir-page12/tif"));
    assert!(contexts.contains(&"/flattifdir-page12/jpg"));
}

#[tokio::test]
async fn no_bad_tifs_family_refuses_tif_and_hides_it_from_stat() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();

    let (status, json) = get_json(&router, "/flatjpgdirnobadtifs-page12/tif").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error_name"], "UnsupportedContextError");

    let (_, json) = get_json(&router, "/flatjpgdirnobadtifs-page12/stat").await;
    let contexts: Vec<&str> = json["contexts_available"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(contexts.contains(&"/flatjpgdirnobadtifs-page12/jpg"));
    assert!(!contexts.iter().any(|c| c.ends_with("/tif")));
}

#[tokio::test]
async fn collection_level_identifier_has_no_representation() {
    let fixtures = Fixtures::new();
    let router = fixtures.router();
    let (status, json) = get_json(&router, "/mvol-0001/tif").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error_name"], "ContextError");
}

#[tokio::test]
async fn unconfigured_family_reports_a_configuration_error() {
    let router = create_router(AppState::new(Config::empty()));
    let (status, json) = get_json(&router, "/flattifdir-page12/tif").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error_name"], "ConfigurationError");

    // Capability reporting is static; it works without any roots configured.
    let (status, json) = get_json(&router, "/flattifdir-page12/stat").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!json["contexts_available"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn cached_transform_survives_fixture_replacement() {
    let fixtures = Fixtures::new();
    let mut config = fixtures.config.clone();
    config.cache.enabled = true;
    config.cache.ttl_seconds = 60;
    let tif_root = config.flat_tif_dir_root.clone().unwrap();
    let router = create_router(AppState::new(config));

    let (status, _, first) = get(&router, "/flattifdir-page12/tif?width=32&height=24").await;
    assert_eq!(status, StatusCode::OK);

    // Replace the master; a cache hit must not re-read it.
    fs::remove_file(tif_root.join("page12.tif")).unwrap();
    write_image(&tif_root.join("page12.tif"), 300, 300);

    let (status, _, second) = get(&router, "/flattifdir-page12/tif?width=32&height=24").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);
}
