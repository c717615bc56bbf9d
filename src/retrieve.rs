//! The per-request retrieval pipeline.
//!
//! One request, one backend instantiation, one derivative resolution, one
//! transform, one cache round-trip. Everything here is synchronous; the
//! HTTP layer fans requests out onto worker threads.

use crate::cache::{CacheKey, CachedOp, ResultCache};
use crate::capability;
use crate::config::Config;
use crate::derive;
use crate::error::{Error, Result};
use crate::registry;
use crate::storage::{AssetKind, OcrVariant, StorageBackend, TechnicalMetadata};
use crate::transform::{self, OutputFormat, RawTransformArgs};
use tracing::debug;

fn backend_for(config: &Config, identifier: &str) -> Result<Box<dyn StorageBackend>> {
    let descriptor = registry::resolve(identifier)?;
    descriptor
        .instantiate(config)
        .map_err(|e| Error::from_storage(e, AssetKind::Tif, identifier))
}

/// Produce the encoded tif or jpg representation, transformed as requested.
pub fn produce_image(
    config: &Config,
    cache: Option<&ResultCache>,
    identifier: &str,
    format: OutputFormat,
    args: &RawTransformArgs,
) -> Result<Vec<u8>> {
    let backend = backend_for(config, identifier)?;
    let kind = match format {
        OutputFormat::Tif => AssetKind::Tif,
        OutputFormat::Jpg => AssetKind::Jpg,
    };
    let master = derive::acquire_master(backend.as_ref(), kind, identifier)?;
    let sanitized = transform::sanitize(args, master.image.width(), master.image.height())?;

    let key = CacheKey {
        identifier: identifier.to_string(),
        operation: match format {
            OutputFormat::Tif => CachedOp::Tif,
            OutputFormat::Jpg => CachedOp::Jpg,
        },
        width: sanitized.width,
        height: sanitized.height,
        crop: sanitized.crop,
        quality: sanitized.quality,
    };
    if let Some(cache) = cache {
        if let Some(bytes) = cache.get(&key) {
            return Ok(bytes);
        }
    }

    let encoded = if args.requests_transform() {
        let transformed = transform::apply(&master.image, &sanitized)?;
        transform::encode(&transformed, format, sanitized.quality)
            .map_err(|e| Error::Retrieval(format!("encoding {kind} for {identifier}: {e}")))?
    } else {
        match transform::encode(&master.image, format, sanitized.quality) {
            Ok(bytes) => bytes,
            // Certain masters decode fine but refuse to re-encode. With no
            // transform requested the verbatim native bytes are just as good;
            // a derived master is a different format, so only the native one
            // may pass through.
            Err(e) if master.derived_from == kind => {
                debug!(identifier, %kind, error = %e,
                    "re-encode failed, returning native bytes verbatim");
                master
                    .source
                    .read()
                    .map_err(|io| Error::Retrieval(io.to_string()))?
            }
            Err(e) => {
                return Err(Error::Retrieval(format!(
                    "encoding {kind} for {identifier}: {e}"
                )));
            }
        }
    };

    if let Some(cache) = cache {
        cache.put(key, encoded.clone());
    }
    Ok(encoded)
}

/// Produce a jpg thumbnail fitting within `width` x `height`.
pub fn produce_thumbnail(
    config: &Config,
    cache: Option<&ResultCache>,
    identifier: &str,
    args: &RawTransformArgs,
) -> Result<Vec<u8>> {
    let backend = backend_for(config, identifier)?;
    let master = derive::acquire_master(backend.as_ref(), AssetKind::Jpg, identifier)?;
    let sanitized = transform::sanitize(args, master.image.width(), master.image.height())?;
    // The handler enforces that width and height are present, so sanitize
    // always resolves both.
    let (Some(width), Some(height)) = (sanitized.width, sanitized.height) else {
        return Err(Error::MissingParameter("width"));
    };

    let key = CacheKey {
        identifier: identifier.to_string(),
        operation: CachedOp::Thumb,
        width: Some(width),
        height: Some(height),
        crop: None,
        quality: sanitized.quality,
    };
    if let Some(cache) = cache {
        if let Some(bytes) = cache.get(&key) {
            return Ok(bytes);
        }
    }

    let thumb = transform::thumbnail(&master.image, width, height);
    let encoded = transform::encode(&thumb, OutputFormat::Jpg, sanitized.quality)
        .map_err(|e| Error::Retrieval(format!("encoding thumbnail for {identifier}: {e}")))?;

    if let Some(cache) = cache {
        cache.put(key, encoded.clone());
    }
    Ok(encoded)
}

/// Native technical metadata for the tif or jpg master.
pub fn technical_metadata(
    config: &Config,
    identifier: &str,
    kind: AssetKind,
) -> Result<TechnicalMetadata> {
    let backend = backend_for(config, identifier)?;
    let result = match kind {
        AssetKind::TifTechmd => backend.get_tif_techmd(identifier),
        AssetKind::JpgTechmd => backend.get_jpg_techmd(identifier),
        other => return Err(Error::Internal(format!("{other} is not technical metadata"))),
    };
    result.map_err(|e| Error::from_storage(e, kind, identifier))
}

/// Byte payload of a document kind: pdf, descriptive metadata, or OCR.
pub fn document(config: &Config, identifier: &str, kind: AssetKind) -> Result<Vec<u8>> {
    let backend = backend_for(config, identifier)?;
    let source = match kind {
        AssetKind::Pdf => backend.get_pdf(identifier),
        AssetKind::DescriptiveMetadata => backend.get_descriptive_metadata(identifier),
        AssetKind::Ocr(variant) => backend.get_ocr(variant, identifier),
        other => return Err(Error::Internal(format!("{other} is not a document kind"))),
    }
    .map_err(|e| Error::from_storage(e, kind, identifier))?;
    source.read().map_err(|e| Error::Retrieval(e.to_string()))
}

/// Contexts servable for an identifier, for `/stat`.
pub fn stat(identifier: &str) -> Result<Vec<String>> {
    let descriptor = registry::resolve(identifier)?;
    Ok(capability::contexts(descriptor, identifier))
}

/// OCR variant lookup for the `/{id}/ocr/{variant}` path segment.
pub fn ocr_variant(segment: &str) -> Result<OcrVariant> {
    OcrVariant::parse(segment).ok_or(Error::UnsupportedContext)
}
