//! Storage backend contract and shared asset types.
//!
//! A [`StorageBackend`] serves some subset of the [`AssetKind`] surface for
//! one family of identifiers. Every operation has a default body returning
//! [`StorageError::Omitted`], the recoverable "not provided natively, derive
//! it from another kind" signal. A backend that wants to forbid an operation
//! outright, including via derivation, returns
//! [`StorageError::Unsupported`] instead; the derivative resolver never
//! catches that one.
//!
//! Backends are constructed fresh per request from the process configuration
//! and discarded afterwards; only transformed results are ever cached.

mod flat;
mod mvol;

pub use flat::{FlatJpgDir, FlatJpgDirNoBadTifs, FlatTifDir};
pub use mvol::{MvolLayer1, MvolLayer2, MvolLayer3, MvolLayer4};

use serde::Serialize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The retrievable representations of an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Tif,
    TifTechmd,
    Jpg,
    JpgTechmd,
    Pdf,
    DescriptiveMetadata,
    Ocr(OcrVariant),
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tif => "tif",
            Self::TifTechmd => "tif technical metadata",
            Self::Jpg => "jpg",
            Self::JpgTechmd => "jpg technical metadata",
            Self::Pdf => "pdf",
            Self::DescriptiveMetadata => "descriptive metadata",
            Self::Ocr(variant) => match variant {
                OcrVariant::Limb => "ocr/limb",
                OcrVariant::Jej => "ocr/jej",
                OcrVariant::Pos => "ocr/pos",
            },
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The OCR flavors an identifier may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OcrVariant {
    /// ALTO XML produced by the LIMB digitization workflow.
    Limb,
    Jej,
    Pos,
}

impl OcrVariant {
    pub const ALL: [OcrVariant; 3] = [OcrVariant::Limb, OcrVariant::Jej, OcrVariant::Pos];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Limb => "limb",
            Self::Jej => "jej",
            Self::Pos => "pos",
        }
    }

    /// Parse a URL path segment into a variant.
    pub fn parse(segment: &str) -> Option<Self> {
        match segment {
            "limb" => Some(Self::Limb),
            "jej" => Some(Self::Jej),
            "pos" => Some(Self::Pos),
            _ => None,
        }
    }
}

/// What a backend hands back for byte-bearing kinds: either a
/// filesystem-resolvable reference or the bytes themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl AssetSource {
    /// Materialize the full byte payload.
    pub fn read(&self) -> io::Result<Vec<u8>> {
        match self {
            Self::Path(path) => std::fs::read(path),
            Self::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

/// Structured record returned by the technical-metadata operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TechnicalMetadata {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Error)]
pub enum StorageError {
    /// Deliberately not provided natively; the caller should try deriving
    /// the kind from another one. Recoverable by design.
    #[error("not provided natively")]
    Omitted,

    /// Forbidden outright, including via derivation. Short-circuits any
    /// fallback chain.
    #[error("refused by this backend")]
    Unsupported,

    /// The backend family is registered but its configuration is incomplete.
    #[error("{0} is not configured")]
    MissingConfiguration(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type for backend operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Per-identifier-family storage implementation.
///
/// Implementors override only the operations their medium actually carries;
/// the defaults signal Omitted so the derivative resolver can fall through.
pub trait StorageBackend {
    fn get_tif(&self, _identifier: &str) -> StorageResult<AssetSource> {
        Err(StorageError::Omitted)
    }

    fn get_tif_techmd(&self, _identifier: &str) -> StorageResult<TechnicalMetadata> {
        Err(StorageError::Omitted)
    }

    fn get_jpg(&self, _identifier: &str) -> StorageResult<AssetSource> {
        Err(StorageError::Omitted)
    }

    fn get_jpg_techmd(&self, _identifier: &str) -> StorageResult<TechnicalMetadata> {
        Err(StorageError::Omitted)
    }

    fn get_pdf(&self, _identifier: &str) -> StorageResult<AssetSource> {
        Err(StorageError::Omitted)
    }

    fn get_descriptive_metadata(&self, _identifier: &str) -> StorageResult<AssetSource> {
        Err(StorageError::Omitted)
    }

    fn get_ocr(&self, _variant: OcrVariant, _identifier: &str) -> StorageResult<AssetSource> {
        Err(StorageError::Omitted)
    }
}
