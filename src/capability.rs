//! Capability reporting for `/stat`.
//!
//! Computes which endpoints are meaningfully servable for an identifier from
//! the backend family's declared capability sets alone, a static,
//! per-family property. Whether the underlying file actually exists is a
//! retrieval-time concern and never checked here.
//!
//! Because a tif can be derived from a jpg and vice versa, a family native
//! in either advertises both endpoints; a suppressed kind is removed again
//! after that closure, so a family that hard-blocks tif never advertises it.

use crate::registry::BackendDescriptor;
use crate::storage::AssetKind;

/// Endpoint paths servable for `identifier`, in declaration order, deduped.
pub fn contexts(descriptor: &BackendDescriptor, identifier: &str) -> Vec<String> {
    let mut kinds: Vec<AssetKind> = Vec::new();
    let mut push = |kinds: &mut Vec<AssetKind>, kind: AssetKind| {
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    };

    for &kind in descriptor.native {
        push(&mut kinds, kind);
        // Derivation-induced capability: either raster kind implies the other.
        match kind {
            AssetKind::Tif => push(&mut kinds, AssetKind::Jpg),
            AssetKind::Jpg => push(&mut kinds, AssetKind::Tif),
            _ => {}
        }
    }

    kinds.retain(|kind| !descriptor.suppressed.contains(kind));

    kinds
        .iter()
        .map(|kind| endpoint_for(*kind, identifier))
        .collect()
}

fn endpoint_for(kind: AssetKind, identifier: &str) -> String {
    match kind {
        AssetKind::Tif => format!("/{identifier}/tif"),
        AssetKind::TifTechmd => format!("/{identifier}/tif/technical_metadata"),
        AssetKind::Jpg => format!("/{identifier}/jpg"),
        AssetKind::JpgTechmd => format!("/{identifier}/jpg/technical_metadata"),
        AssetKind::Pdf => format!("/{identifier}/pdf"),
        AssetKind::DescriptiveMetadata => format!("/{identifier}/metadata"),
        AssetKind::Ocr(variant) => format!("/{identifier}/ocr/{}", variant.as_str()),
    }
}
