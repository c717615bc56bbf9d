//! Derivative resolution.
//!
//! When a backend omits the requested image kind, a master raster is derived
//! from whichever other image-bearing kind the backend does provide, in a
//! fixed priority order:
//!
//! - tif ← pdf ← jpg
//! - jpg ← tif ← pdf
//!
//! The control-flow contract: `Omitted` means try the next source, anything
//! else means stop. A backend that answers a source with real data whose
//! bytes then fail to decode intended to serve that source; the breakage is
//! reported, never papered over by the next fallback.

use crate::error::{Error, Result};
use crate::storage::{AssetKind, AssetSource, StorageBackend, StorageError};
use image::DynamicImage;
use tracing::{debug, info};

const TIF_FALLBACKS: &[AssetKind] = &[AssetKind::Pdf, AssetKind::Jpg];
const JPG_FALLBACKS: &[AssetKind] = &[AssetKind::Tif, AssetKind::Pdf];

/// A master raster ready for the transform pipeline.
#[derive(Debug)]
pub struct Master {
    pub image: DynamicImage,
    /// The backend's answer, kept so an untransformed request can fall back
    /// to the verbatim bytes when re-encoding fails.
    pub source: AssetSource,
    /// The kind the raster actually came from.
    pub derived_from: AssetKind,
}

fn fallbacks_for(kind: AssetKind) -> &'static [AssetKind] {
    match kind {
        AssetKind::Tif => TIF_FALLBACKS,
        AssetKind::Jpg => JPG_FALLBACKS,
        _ => &[],
    }
}

fn fetch(
    backend: &dyn StorageBackend,
    kind: AssetKind,
    identifier: &str,
) -> std::result::Result<AssetSource, StorageError> {
    match kind {
        AssetKind::Tif => backend.get_tif(identifier),
        AssetKind::Jpg => backend.get_jpg(identifier),
        AssetKind::Pdf => backend.get_pdf(identifier),
        other => panic!("{other} is not an image-bearing kind"),
    }
}

fn open_raster(source: &AssetSource, kind: AssetKind, identifier: &str) -> Result<DynamicImage> {
    let decoded = match source {
        AssetSource::Path(path) => image::open(path),
        AssetSource::Bytes(bytes) => image::load_from_memory(bytes),
    };
    decoded.map_err(|e| Error::Retrieval(format!("opening {kind} for {identifier}: {e}")))
}

/// Obtain the master raster for `kind`: the native implementation first,
/// then the declared fallback sources.
pub fn acquire_master(
    backend: &dyn StorageBackend,
    kind: AssetKind,
    identifier: &str,
) -> Result<Master> {
    match fetch(backend, kind, identifier) {
        Ok(source) => {
            let image = open_raster(&source, kind, identifier)?;
            info!(identifier, %kind, "utilized explicit retrieval implementation");
            return Ok(Master {
                image,
                source,
                derived_from: kind,
            });
        }
        Err(StorageError::Omitted) => {
            debug!(identifier, %kind, "explicit implementation omitted, trying fallbacks");
        }
        Err(other) => return Err(Error::from_storage(other, kind, identifier)),
    }

    for &fallback in fallbacks_for(kind) {
        match fetch(backend, fallback, identifier) {
            Ok(source) => {
                let image = open_raster(&source, fallback, identifier)?;
                info!(identifier, %kind, from = %fallback, "created derivative from fallback source");
                return Ok(Master {
                    image,
                    source,
                    derived_from: fallback,
                });
            }
            Err(StorageError::Omitted) => continue,
            Err(other) => return Err(Error::from_storage(other, fallback, identifier)),
        }
    }

    Err(Error::ContextUnavailable {
        kind: kind.to_string(),
        identifier: identifier.to_string(),
    })
}
