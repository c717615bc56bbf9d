//! Backend registry and identifier resolution.
//!
//! One [`BackendDescriptor`] per backend family, in a fixed order. A
//! descriptor bundles the family's claim predicate, its constructor, and its
//! declared capability sets, declared at registration rather than inferred
//! from the implementation, so `/stat` never has to introspect a backend.
//!
//! Claim predicates are expected to partition the identifier space; the
//! registry does not detect overlap. First match wins, which only matters as
//! a tie-break when namespaces are misconfigured.

use crate::config::Config;
use crate::error::Error;
use crate::storage::{
    AssetKind, FlatJpgDir, FlatJpgDirNoBadTifs, FlatTifDir, MvolLayer1, MvolLayer2, MvolLayer3,
    MvolLayer4, OcrVariant, StorageBackend, StorageError,
};

/// One registered backend family.
#[derive(Debug)]
pub struct BackendDescriptor {
    pub name: &'static str,
    claim: fn(&str) -> bool,
    build: fn(&Config) -> Result<Box<dyn StorageBackend>, StorageError>,
    /// Kinds this family provides natively.
    pub native: &'static [AssetKind],
    /// Kinds this family forbids even when derivation could produce them.
    pub suppressed: &'static [AssetKind],
}

impl BackendDescriptor {
    pub fn claims(&self, identifier: &str) -> bool {
        (self.claim)(identifier)
    }

    /// Construct a backend instance for one request.
    pub fn instantiate(&self, config: &Config) -> Result<Box<dyn StorageBackend>, StorageError> {
        (self.build)(config)
    }
}

/// Registration order is fixed; the namespaces are disjoint by construction.
static DESCRIPTORS: &[BackendDescriptor] = &[
    BackendDescriptor {
        name: "flat-tif-dir",
        claim: FlatTifDir::claims,
        build: |config| Ok(Box::new(FlatTifDir::new(config)?)),
        native: &[AssetKind::Tif],
        suppressed: &[],
    },
    BackendDescriptor {
        name: "flat-jpg-dir",
        claim: FlatJpgDir::claims,
        build: |config| Ok(Box::new(FlatJpgDir::new(config)?)),
        native: &[AssetKind::Jpg, AssetKind::JpgTechmd],
        suppressed: &[],
    },
    BackendDescriptor {
        name: "flat-jpg-dir-no-bad-tifs",
        claim: FlatJpgDirNoBadTifs::claims,
        build: |config| Ok(Box::new(FlatJpgDirNoBadTifs::new(config)?)),
        native: &[AssetKind::Jpg, AssetKind::JpgTechmd],
        suppressed: &[AssetKind::Tif],
    },
    BackendDescriptor {
        name: "mvol-collection",
        claim: MvolLayer1::claims,
        build: |config| Ok(Box::new(MvolLayer1::new(config)?)),
        native: &[],
        suppressed: &[],
    },
    BackendDescriptor {
        name: "mvol-title",
        claim: MvolLayer2::claims,
        build: |config| Ok(Box::new(MvolLayer2::new(config)?)),
        native: &[],
        suppressed: &[],
    },
    BackendDescriptor {
        name: "mvol-issue",
        claim: MvolLayer3::claims,
        build: |config| Ok(Box::new(MvolLayer3::new(config)?)),
        native: &[AssetKind::Pdf, AssetKind::DescriptiveMetadata],
        suppressed: &[],
    },
    BackendDescriptor {
        name: "mvol-page",
        claim: MvolLayer4::claims,
        build: |config| Ok(Box::new(MvolLayer4::new(config)?)),
        native: &[
            AssetKind::Tif,
            AssetKind::TifTechmd,
            AssetKind::Ocr(OcrVariant::Limb),
        ],
        suppressed: &[],
    },
];

/// Resolve an identifier to the backend family that owns it.
pub fn resolve(identifier: &str) -> Result<&'static BackendDescriptor, Error> {
    DESCRIPTORS
        .iter()
        .find(|descriptor| descriptor.claims(identifier))
        .ok_or_else(|| Error::UnknownIdentifierFormat(identifier.to_string()))
}
