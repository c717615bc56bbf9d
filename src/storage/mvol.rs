//! The mvol serial-publication backends.
//!
//! A fully qualified identifier names a page inside a digitized volume:
//! `mvol-0004-1930-0203_0017` is page 17 of the `0004/1930/0203` unit. The
//! four layers claim successively longer identifier shapes and serve the
//! assets that exist at their level of the owncloud-synced preservation
//! tree:
//!
//! ```text
//! <root>/data/<user>/files/<subpath>/mvol/0004/1930/0203/
//! ├── mvol-0004-1930-0203.pdf          (layer 3)
//! ├── mvol-0004-1930-0203.dc.xml       (layer 3)
//! ├── TIFF/mvol-0004-1930-0203_0017.tif   (layer 4)
//! └── ALTO/mvol-0004-1930-0203_0017.xml   (layer 4)
//! ```
//!
//! Layers 1 and 2 exist so that collection- and title-level identifiers are
//! recognized as well-formed; they carry no retrievable assets yet.

use super::{AssetSource, OcrVariant, StorageBackend, StorageError, StorageResult, TechnicalMetadata};
use crate::config::Config;
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

static LAYER1_CLAIM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^mvol-[0-9]{4}$").unwrap());
static LAYER2_CLAIM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^mvol-[0-9]{4}-[0-9]{4}$").unwrap());
static LAYER3_CLAIM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^mvol-[0-9]{4}-[0-9]{4}-[0-9]{4}$").unwrap());
static LAYER4_CLAIM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^mvol-[0-9]{4}-[0-9]{4}-[0-9]{4}_[0-9]{4}$").unwrap());

/// Owncloud mount coordinates shared by the asset-bearing layers.
struct MvolTree {
    root: PathBuf,
    user: String,
    subpath: String,
}

impl MvolTree {
    fn from_config(config: &Config) -> StorageResult<Self> {
        let root = config
            .mvol
            .owncloud_root
            .clone()
            .ok_or(StorageError::MissingConfiguration("mvol.owncloud_root"))?;
        let user = config
            .mvol
            .owncloud_user
            .clone()
            .ok_or(StorageError::MissingConfiguration("mvol.owncloud_user"))?;
        let subpath = config
            .mvol
            .owncloud_subpath
            .clone()
            .ok_or(StorageError::MissingConfiguration("mvol.owncloud_subpath"))?;
        Ok(Self {
            root,
            user,
            subpath,
        })
    }

    /// Directory of the intellectual unit the identifier belongs to. A page
    /// suffix (`_NNNN`) addresses a file inside that same directory.
    fn unit_dir(&self, identifier: &str) -> PathBuf {
        let mut dir = self
            .root
            .join("data")
            .join(&self.user)
            .join("files")
            .join(&self.subpath)
            .join("mvol");
        for segment in identifier.split('-').skip(1) {
            dir.push(segment.split('_').next().unwrap_or(segment));
        }
        dir
    }
}

/// Collection level: `mvol-NNNN`. Recognized, nothing retrievable.
pub struct MvolLayer1;

impl MvolLayer1 {
    pub fn claims(identifier: &str) -> bool {
        LAYER1_CLAIM.is_match(identifier)
    }

    pub fn new(_config: &Config) -> StorageResult<Self> {
        Ok(Self)
    }
}

impl StorageBackend for MvolLayer1 {}

/// Title level: `mvol-NNNN-NNNN`. Recognized, nothing retrievable.
pub struct MvolLayer2;

impl MvolLayer2 {
    pub fn claims(identifier: &str) -> bool {
        LAYER2_CLAIM.is_match(identifier)
    }

    pub fn new(_config: &Config) -> StorageResult<Self> {
        Ok(Self)
    }
}

impl StorageBackend for MvolLayer2 {}

/// Issue level: `mvol-NNNN-NNNN-NNNN`. Serves the issue PDF and the Dublin
/// Core descriptive record.
pub struct MvolLayer3 {
    tree: MvolTree,
}

impl MvolLayer3 {
    pub fn claims(identifier: &str) -> bool {
        LAYER3_CLAIM.is_match(identifier)
    }

    pub fn new(config: &Config) -> StorageResult<Self> {
        Ok(Self {
            tree: MvolTree::from_config(config)?,
        })
    }
}

impl StorageBackend for MvolLayer3 {
    fn get_pdf(&self, identifier: &str) -> StorageResult<AssetSource> {
        Ok(AssetSource::Path(
            self.tree.unit_dir(identifier).join(format!("{identifier}.pdf")),
        ))
    }

    fn get_descriptive_metadata(&self, identifier: &str) -> StorageResult<AssetSource> {
        Ok(AssetSource::Path(
            self.tree
                .unit_dir(identifier)
                .join(format!("{identifier}.dc.xml")),
        ))
    }
}

/// Page level: `mvol-NNNN-NNNN-NNNN_NNNN`. Serves the page tif master, its
/// technical metadata, and the LIMB OCR record.
pub struct MvolLayer4 {
    tree: MvolTree,
}

impl MvolLayer4 {
    pub fn claims(identifier: &str) -> bool {
        LAYER4_CLAIM.is_match(identifier)
    }

    pub fn new(config: &Config) -> StorageResult<Self> {
        Ok(Self {
            tree: MvolTree::from_config(config)?,
        })
    }

    fn tif_path(&self, identifier: &str) -> PathBuf {
        self.tree
            .unit_dir(identifier)
            .join("TIFF")
            .join(format!("{identifier}.tif"))
    }
}

impl StorageBackend for MvolLayer4 {
    fn get_tif(&self, identifier: &str) -> StorageResult<AssetSource> {
        Ok(AssetSource::Path(self.tif_path(identifier)))
    }

    fn get_tif_techmd(&self, identifier: &str) -> StorageResult<TechnicalMetadata> {
        let (width, height) = image::image_dimensions(self.tif_path(identifier))?;
        Ok(TechnicalMetadata { width, height })
    }

    fn get_ocr(&self, variant: OcrVariant, identifier: &str) -> StorageResult<AssetSource> {
        match variant {
            OcrVariant::Limb => Ok(AssetSource::Path(
                self.tree
                    .unit_dir(identifier)
                    .join("ALTO")
                    .join(format!("{identifier}.xml")),
            )),
            // Only LIMB output is synced into the preservation tree.
            OcrVariant::Jej | OcrVariant::Pos => Err(StorageError::Omitted),
        }
    }
}
