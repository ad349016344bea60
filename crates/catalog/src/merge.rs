//! Merger: left outer join of products to inventory on Variant SKU.

use std::collections::{HashMap, HashSet};

use curator_core::{Handle, Sku};

use crate::record::{InventorySet, ProductSet};

/// One product row with the quantity of its matching inventory row attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRecord {
    /// Index of the originating row in the product set.
    pub product_row: usize,
    /// Index of the matching inventory row, if any.
    pub inventory_row: Option<usize>,
    pub handle: Handle,
    pub sku: Option<Sku>,
    pub title: String,
    pub image_src: Option<String>,
    /// `None` when no inventory row matched, or the matched row has no quantity.
    pub quantity: Option<u64>,
}

/// Output of [`merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub records: Vec<MergedRecord>,
    /// SKUs that matched more than one inventory row, in first-match order.
    ///
    /// Those product rows are fanned out (one merged row per inventory row)
    /// rather than collapsed.
    pub duplicate_skus: Vec<Sku>,
}

impl MergeOutcome {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Left-join `products` to `inventory` on exact SKU match.
///
/// - Every product row appears at least once, in product order.
/// - A row whose SKU is empty or absent from `inventory` gets `quantity: None`.
/// - A SKU with several inventory rows yields one merged row per inventory row,
///   in inventory order.
///
/// Both sets were schema-checked when they were built, so this cannot fail.
pub fn merge(products: &ProductSet, inventory: &InventorySet) -> MergeOutcome {
    let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, record) in inventory.records().iter().enumerate() {
        if let Some(sku) = record.sku() {
            index.entry(sku.as_str()).or_default().push(i);
        }
    }

    let mut records = Vec::with_capacity(products.len());
    let mut duplicate_skus = Vec::new();
    let mut seen_duplicates = HashSet::new();

    for (product_row, product) in products.records().iter().enumerate() {
        let matches = product
            .sku()
            .and_then(|sku| index.get(sku.as_str()))
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let base = MergedRecord {
            product_row,
            inventory_row: None,
            handle: product.handle().clone(),
            sku: product.sku().cloned(),
            title: product.title().to_string(),
            image_src: product.image_src().map(str::to_string),
            quantity: None,
        };

        if matches.is_empty() {
            records.push(base);
            continue;
        }

        if matches.len() > 1 {
            if let Some(sku) = product.sku() {
                if seen_duplicates.insert(sku.clone()) {
                    duplicate_skus.push(sku.clone());
                }
            }
        }

        for &inventory_row in matches {
            records.push(MergedRecord {
                inventory_row: Some(inventory_row),
                quantity: inventory.records()[inventory_row].quantity(),
                ..base.clone()
            });
        }
    }

    if !duplicate_skus.is_empty() {
        tracing::warn!(
            skus = ?duplicate_skus,
            "inventory has several rows for the same SKU; merged rows were fanned out"
        );
    }

    MergeOutcome {
        records,
        duplicate_skus,
    }
}
