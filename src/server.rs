//! HTTP surface: application state, router, and handlers.
//!
//! The handlers are thin adapters over [`crate::retrieve`]: decode the path
//! and query, hop onto the blocking pool for anything that touches disk or
//! pixels, and pick the response mimetype. All decisions live in the core
//! modules.

use crate::cache::ResultCache;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::retrieve;
use crate::storage::{AssetKind, OcrVariant};
use crate::transform::{OutputFormat, RawTransformArgs};
use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

/// Shared application state. Request handlers clone it into blocking tasks;
/// everything inside is read-only or internally synchronized.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Option<Arc<ResultCache>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let cache = config
            .cache
            .enabled
            .then(|| Arc::new(ResultCache::new(Duration::from_secs(config.cache.ttl_seconds))));
        Self {
            config: Arc::new(config),
            cache,
        }
    }
}

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/version", get(version))
        .route("/{identifier}/stat", get(stat))
        .route("/{identifier}/tif", get(get_tif))
        .route("/{identifier}/tif/technical_metadata", get(get_tif_techmd))
        .route("/{identifier}/jpg", get(get_jpg))
        .route("/{identifier}/jpg/thumb", get(get_jpg_thumb))
        .route("/{identifier}/jpg/technical_metadata", get(get_jpg_techmd))
        .route("/{identifier}/pdf", get(get_pdf))
        .route("/{identifier}/metadata", get(get_metadata))
        .route("/{identifier}/ocr/{variant}", get(get_ocr))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run a synchronous retrieval on the blocking pool.
async fn run_blocking<T, F>(task: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| Error::Internal(format!("worker task failed: {e}")))?
}

fn bytes_response(mimetype: &'static str, bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, mimetype)], bytes).into_response()
}

async fn root() -> Json<Value> {
    Json(json!({"status": "Not broken!"}))
}

#[derive(Debug, Serialize)]
struct VersionResponse {
    version: &'static str,
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Serialize)]
struct StatResponse {
    identifier: String,
    contexts_available: Vec<String>,
}

async fn stat(Path(identifier): Path<String>) -> Result<Json<StatResponse>> {
    let contexts_available = retrieve::stat(&identifier)?;
    Ok(Json(StatResponse {
        identifier,
        contexts_available,
    }))
}

async fn get_tif(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Query(args): Query<RawTransformArgs>,
) -> Result<Response> {
    let bytes = run_blocking(move || {
        retrieve::produce_image(
            &state.config,
            state.cache.as_deref(),
            &identifier,
            OutputFormat::Tif,
            &args,
        )
    })
    .await?;
    Ok(bytes_response(OutputFormat::Tif.mimetype(), bytes))
}

async fn get_jpg(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Query(args): Query<RawTransformArgs>,
) -> Result<Response> {
    let bytes = run_blocking(move || {
        retrieve::produce_image(
            &state.config,
            state.cache.as_deref(),
            &identifier,
            OutputFormat::Jpg,
            &args,
        )
    })
    .await?;
    Ok(bytes_response(OutputFormat::Jpg.mimetype(), bytes))
}

#[derive(Debug, Deserialize)]
struct ThumbArgs {
    width: Option<u32>,
    height: Option<u32>,
    quality: Option<u8>,
}

async fn get_jpg_thumb(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Query(args): Query<ThumbArgs>,
) -> Result<Response> {
    let width = args.width.ok_or(Error::MissingParameter("width"))?;
    let height = args.height.ok_or(Error::MissingParameter("height"))?;
    let transform_args = RawTransformArgs {
        width: Some(width),
        height: Some(height),
        quality: args.quality,
        ..RawTransformArgs::default()
    };
    let bytes = run_blocking(move || {
        retrieve::produce_thumbnail(
            &state.config,
            state.cache.as_deref(),
            &identifier,
            &transform_args,
        )
    })
    .await?;
    Ok(bytes_response(OutputFormat::Jpg.mimetype(), bytes))
}

async fn get_tif_techmd(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<crate::storage::TechnicalMetadata>> {
    let techmd = run_blocking(move || {
        retrieve::technical_metadata(&state.config, &identifier, AssetKind::TifTechmd)
    })
    .await?;
    Ok(Json(techmd))
}

async fn get_jpg_techmd(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<crate::storage::TechnicalMetadata>> {
    let techmd = run_blocking(move || {
        retrieve::technical_metadata(&state.config, &identifier, AssetKind::JpgTechmd)
    })
    .await?;
    Ok(Json(techmd))
}

async fn get_pdf(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Response> {
    let bytes =
        run_blocking(move || retrieve::document(&state.config, &identifier, AssetKind::Pdf))
            .await?;
    Ok(bytes_response("application/pdf", bytes))
}

async fn get_metadata(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Response> {
    let bytes = run_blocking(move || {
        retrieve::document(&state.config, &identifier, AssetKind::DescriptiveMetadata)
    })
    .await?;
    Ok(bytes_response("text/xml", bytes))
}

async fn get_ocr(
    State(state): State<AppState>,
    Path((identifier, variant)): Path<(String, String)>,
) -> Result<Response> {
    let variant = retrieve::ocr_variant(&variant)?;
    let bytes = run_blocking(move || {
        retrieve::document(&state.config, &identifier, AssetKind::Ocr(variant))
    })
    .await?;
    let mimetype = match variant {
        // LIMB output is ALTO XML; the others are plain text dumps.
        OcrVariant::Limb => "text/xml",
        OcrVariant::Jej | OcrVariant::Pos => "text/plain",
    };
    Ok(bytes_response(mimetype, bytes))
}
