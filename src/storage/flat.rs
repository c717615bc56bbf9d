//! Flat-directory backend families.
//!
//! Each family serves a single directory of image files whose names are the
//! identifier with its namespace prefix stripped: `flattifdir-page12` maps to
//! `<root>/page12.tif`. The prefix doubles as the claim namespace, so the
//! families stay disjoint.

use super::{AssetSource, StorageBackend, StorageError, StorageResult, TechnicalMetadata};
use crate::config::Config;
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

static FLAT_TIF_CLAIM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^flattifdir-[a-z0-9]+$").unwrap());
static FLAT_JPG_CLAIM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^flatjpgdir-[a-z0-9]+$").unwrap());
static NO_BAD_TIFS_CLAIM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^flatjpgdirnobadtifs-[a-z0-9]+$").unwrap());

/// A directory of tif masters, served as tifs natively and as jpgs by
/// derivation.
pub struct FlatTifDir {
    root: PathBuf,
}

impl FlatTifDir {
    pub fn claims(identifier: &str) -> bool {
        FLAT_TIF_CLAIM.is_match(identifier)
    }

    pub fn new(config: &Config) -> StorageResult<Self> {
        let root = config
            .flat_tif_dir_root
            .clone()
            .ok_or(StorageError::MissingConfiguration("flat_tif_dir_root"))?;
        Ok(Self { root })
    }

    fn file_path(&self, identifier: &str) -> PathBuf {
        let stem = identifier.strip_prefix("flattifdir-").unwrap_or(identifier);
        self.root.join(format!("{stem}.tif"))
    }
}

impl StorageBackend for FlatTifDir {
    fn get_tif(&self, identifier: &str) -> StorageResult<AssetSource> {
        Ok(AssetSource::Path(self.file_path(identifier)))
    }
}

/// A directory of jpg masters, served as jpgs natively and as tifs by
/// derivation.
///
/// The namespace prefix is a parameter so [`FlatJpgDirNoBadTifs`] can share
/// the path arithmetic under its own namespace.
pub struct FlatJpgDir {
    root: PathBuf,
    prefix: &'static str,
}

impl FlatJpgDir {
    pub fn claims(identifier: &str) -> bool {
        FLAT_JPG_CLAIM.is_match(identifier)
    }

    pub fn new(config: &Config) -> StorageResult<Self> {
        Self::with_prefix(config, "flatjpgdir-")
    }

    fn with_prefix(config: &Config, prefix: &'static str) -> StorageResult<Self> {
        let root = config
            .flat_jpg_dir_root
            .clone()
            .ok_or(StorageError::MissingConfiguration("flat_jpg_dir_root"))?;
        Ok(Self { root, prefix })
    }

    fn file_path(&self, identifier: &str) -> PathBuf {
        let stem = identifier.strip_prefix(self.prefix).unwrap_or(identifier);
        self.root.join(format!("{stem}.jpg"))
    }
}

impl StorageBackend for FlatJpgDir {
    fn get_jpg(&self, identifier: &str) -> StorageResult<AssetSource> {
        Ok(AssetSource::Path(self.file_path(identifier)))
    }

    fn get_jpg_techmd(&self, identifier: &str) -> StorageResult<TechnicalMetadata> {
        let (width, height) = image::image_dimensions(self.file_path(identifier))?;
        Ok(TechnicalMetadata { width, height })
    }
}

/// [`FlatJpgDir`] under its own namespace, with tif production forbidden.
///
/// Deriving a tif from a jpg master bakes compression artifacts into a format
/// consumers expect to be lossless, so this family hard-blocks the tif kind
/// rather than letting the derivative resolver fall through to the jpg.
pub struct FlatJpgDirNoBadTifs {
    inner: FlatJpgDir,
}

impl FlatJpgDirNoBadTifs {
    pub fn claims(identifier: &str) -> bool {
        NO_BAD_TIFS_CLAIM.is_match(identifier)
    }

    pub fn new(config: &Config) -> StorageResult<Self> {
        Ok(Self {
            inner: FlatJpgDir::with_prefix(config, "flatjpgdirnobadtifs-")?,
        })
    }
}

impl StorageBackend for FlatJpgDirNoBadTifs {
    fn get_tif(&self, _identifier: &str) -> StorageResult<AssetSource> {
        Err(StorageError::Unsupported)
    }

    fn get_jpg(&self, identifier: &str) -> StorageResult<AssetSource> {
        self.inner.get_jpg(identifier)
    }

    fn get_jpg_techmd(&self, identifier: &str) -> StorageResult<TechnicalMetadata> {
        self.inner.get_jpg_techmd(identifier)
    }
}
