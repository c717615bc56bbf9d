//! Transform parameter sanitization and raster execution.
//!
//! Sanitization turns raw query parameters plus the master's dimensions into
//! a concrete plan:
//!
//! - `scale` is mutually exclusive with `width`/`height`.
//! - One of `width`/`height` alone is filled with the original dimension
//!   verbatim, deliberately not aspect-scaled.
//! - `width`/`height` are capped at 2× the original and floored at 10;
//!   `scale` is capped at 2.0 and floored at 0.01. The upper cap is applied
//!   before the floor, so a tiny original still floors at 10.
//! - `quality` defaults to 95 and is capped at 95, the practical JPEG
//!   encoder ceiling.
//! - Crop coordinates come all together or not at all, and must describe a
//!   non-empty box.
//!
//! Execution order: exact resize (or scale) first, then crop on the resized
//! raster. Thumbnails instead fit within the requested box preserving aspect
//! ratio.

use crate::error::{Error, Result};
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use serde::Deserialize;
use std::io::Cursor;
use tracing::info;

/// Practical JPEG quality ceiling; values above it buy file size, not fidelity.
const MAX_QUALITY: u8 = 95;
/// Smallest dimension a resize may target.
const MIN_DIMENSION: u32 = 10;
/// Largest multiple of the original a resize may target.
const MAX_UPSCALE: u32 = 2;
const MIN_SCALE: f32 = 0.01;
const MAX_SCALE: f32 = 2.0;

/// Raw query parameters, straight off the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct RawTransformArgs {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub scale: Option<f32>,
    pub quality: Option<u8>,
    pub cropstartx: Option<u32>,
    pub cropstarty: Option<u32>,
    pub cropendx: Option<u32>,
    pub cropendy: Option<u32>,
}

impl RawTransformArgs {
    /// Whether any geometric work was requested at all. Quality alone does
    /// not count: it only shapes the encode step.
    pub fn requests_transform(&self) -> bool {
        self.width.is_some()
            || self.height.is_some()
            || self.scale.is_some()
            || self.cropstartx.is_some()
            || self.cropstarty.is_some()
            || self.cropendx.is_some()
            || self.cropendy.is_some()
    }
}

/// Crop box in resized-raster coordinates, exclusive end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CropBox {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

/// A validated, clamped transform plan. `width`/`height` are the concrete
/// target dimensions (scale is already resolved against the original), so
/// equivalent requests sanitize to the same plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizedTransform {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub crop: Option<CropBox>,
    pub quality: u8,
}

/// Validate and clamp raw parameters against the master's dimensions.
pub fn sanitize(
    args: &RawTransformArgs,
    o_width: u32,
    o_height: u32,
) -> Result<SanitizedTransform> {
    if args.scale.is_some() && (args.width.is_some() || args.height.is_some()) {
        return Err(Error::MutuallyExclusiveParameters);
    }

    let crop = sanitize_crop(args)?;

    let (width, height) = if args.width.is_some() || args.height.is_some() {
        // Fill the missing axis with the original dimension verbatim.
        let width = args.width.unwrap_or(o_width);
        let height = args.height.unwrap_or(o_height);
        (
            Some(clamp_dimension(width, o_width, "width")),
            Some(clamp_dimension(height, o_height, "height")),
        )
    } else if let Some(scale) = args.scale {
        let scale = clamp_scale(scale);
        let width = ((o_width as f32 * scale).floor() as u32).max(1);
        let height = ((o_height as f32 * scale).floor() as u32).max(1);
        (Some(width), Some(height))
    } else {
        (None, None)
    };

    let quality = match args.quality {
        Some(q) if q > MAX_QUALITY => {
            info!(requested = q, "quality above encoder ceiling, capping");
            MAX_QUALITY
        }
        Some(q) => q,
        None => MAX_QUALITY,
    };

    Ok(SanitizedTransform {
        width,
        height,
        crop,
        quality,
    })
}

fn clamp_dimension(requested: u32, original: u32, axis: &str) -> u32 {
    let ceiling = MAX_UPSCALE * original;
    let mut value = requested;
    if value > ceiling {
        info!(axis, requested, ceiling, "dimension above 2x original, capping");
        value = ceiling;
    }
    if value < MIN_DIMENSION {
        info!(axis, requested, floor = MIN_DIMENSION, "dimension below floor, raising");
        value = MIN_DIMENSION;
    }
    value
}

fn clamp_scale(requested: f32) -> f32 {
    if requested > MAX_SCALE {
        info!(requested, ceiling = MAX_SCALE, "scale above ceiling, capping");
        MAX_SCALE
    } else if requested < MIN_SCALE {
        info!(requested, floor = MIN_SCALE, "scale below floor, raising");
        MIN_SCALE
    } else {
        requested
    }
}

fn sanitize_crop(args: &RawTransformArgs) -> Result<Option<CropBox>> {
    let coordinates = [
        args.cropstartx,
        args.cropstarty,
        args.cropendx,
        args.cropendy,
    ];
    let supplied = coordinates.iter().filter(|c| c.is_some()).count();
    match supplied {
        0 => Ok(None),
        4 => {
            let crop = CropBox {
                x0: args.cropstartx.unwrap_or_default(),
                y0: args.cropstarty.unwrap_or_default(),
                x1: args.cropendx.unwrap_or_default(),
                y1: args.cropendy.unwrap_or_default(),
            };
            if crop.x1 <= crop.x0 || crop.y1 <= crop.y0 {
                return Err(Error::InvalidCrop(
                    "Crop end coordinates must exceed the start coordinates".to_string(),
                ));
            }
            Ok(Some(crop))
        }
        _ => Err(Error::InvalidCrop(
            "Crop requires cropstartx, cropstarty, cropendx, and cropendy together".to_string(),
        )),
    }
}

/// Apply the resize-then-crop plan to a raster.
pub fn apply(image: &DynamicImage, transform: &SanitizedTransform) -> Result<DynamicImage> {
    let resized = match (transform.width, transform.height) {
        (Some(width), Some(height)) => image.resize_exact(width, height, FilterType::Lanczos3),
        _ => image.clone(),
    };

    let Some(crop) = transform.crop else {
        return Ok(resized);
    };

    let x1 = crop.x1.min(resized.width());
    let y1 = crop.y1.min(resized.height());
    if crop.x0 >= x1 || crop.y0 >= y1 {
        return Err(Error::InvalidCrop(
            "Crop box lies outside the image".to_string(),
        ));
    }
    Ok(resized.crop_imm(crop.x0, crop.y0, x1 - crop.x0, y1 - crop.y0))
}

/// Fit within the requested box preserving aspect ratio.
pub fn thumbnail(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    image.thumbnail(width, height)
}

/// Output encodings of the image endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Tif,
    Jpg,
}

impl OutputFormat {
    pub fn mimetype(&self) -> &'static str {
        match self {
            Self::Tif => "image/tif",
            Self::Jpg => "image/jpg",
        }
    }
}

/// Encode a raster for the wire. Quality applies to JPEG only. Errors are
/// left as `image::ImageError` so the retrieval pipeline can decide whether
/// the verbatim-bytes fallback applies.
pub fn encode(
    image: &DynamicImage,
    format: OutputFormat,
    quality: u8,
) -> std::result::Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    match format {
        OutputFormat::Tif => {
            image.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Tiff)?;
        }
        OutputFormat::Jpg => {
            // The JPEG encoder takes 8-bit grayscale or RGB; flatten anything
            // else (alpha, 16-bit tif masters) instead of failing.
            let flattened;
            let encodable = match image {
                DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => image,
                _ => {
                    flattened = DynamicImage::ImageRgb8(image.to_rgb8());
                    &flattened
                }
            };
            let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
            encodable.write_with_encoder(encoder)?;
        }
    }
    Ok(bytes)
}
