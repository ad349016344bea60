//! Grouper: one display unit per Handle.

use std::collections::HashMap;

use curator_core::{Handle, Sku};
use serde::{Deserialize, Serialize};

use crate::merge::MergedRecord;

/// A variant that has both a SKU and a known quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantStock {
    pub sku: Sku,
    pub quantity: u64,
}

/// Product-level view over all merged rows sharing one Handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductGroup {
    pub handle: Handle,
    /// Title of the first row in the group.
    pub title: String,
    /// Image of the first row in the group.
    pub image_src: Option<String>,
    /// (SKU, quantity) pairs in row order; rows missing either are left out.
    pub variants: Vec<VariantStock>,
}

/// Partition merged rows by Handle, ordered by each Handle's first appearance.
///
/// The first row encountered for a Handle supplies the representative title and
/// image, even when it is empty and a later row is not. No sorting is applied.
/// Groups without any stocked variant are still emitted.
pub fn group(merged: &[MergedRecord]) -> Vec<ProductGroup> {
    let mut groups: Vec<ProductGroup> = Vec::new();
    let mut positions: HashMap<&Handle, usize> = HashMap::new();

    for record in merged {
        let at = *positions.entry(&record.handle).or_insert_with(|| {
            groups.push(ProductGroup {
                handle: record.handle.clone(),
                title: record.title.clone(),
                image_src: record.image_src.clone(),
                variants: Vec::new(),
            });
            groups.len() - 1
        });

        if let (Some(sku), Some(quantity)) = (&record.sku, record.quantity) {
            groups[at].variants.push(VariantStock {
                sku: sku.clone(),
                quantity,
            });
        }
    }

    groups
}
