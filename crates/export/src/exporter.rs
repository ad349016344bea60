use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use curator_catalog::record::{InventoryRecord, ProductRecord};
use curator_catalog::{InventorySet, ProductSet, RecordSchema};
use curator_core::{CuratorError, CuratorResult, Handle, Sku};

/// strftime pattern shared by both export file names (`YYYYMMDD_HHMMSS`).
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// One serialized CSV artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    /// UTF-8 CSV: header row, then one line per record.
    pub bytes: Vec<u8>,
    /// Number of data rows (the header is not counted).
    pub rows: usize,
}

/// The two filtered record sets of one export, named with one shared timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBundle {
    pub timestamp: String,
    pub products: ExportFile,
    pub inventory: ExportFile,
    /// Selected Handles with no row in the current product set (stale selections).
    pub unmatched_handles: Vec<Handle>,
}

/// Serializable digest of an export, for logs and machine-readable output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub timestamp: String,
    pub products_file: String,
    pub product_rows: usize,
    pub inventory_file: String,
    pub inventory_rows: usize,
    pub unmatched_handles: Vec<Handle>,
}

impl ExportBundle {
    pub fn summary(&self) -> ExportSummary {
        ExportSummary {
            timestamp: self.timestamp.clone(),
            products_file: self.products.file_name.clone(),
            product_rows: self.products.rows,
            inventory_file: self.inventory.file_name.clone(),
            inventory_rows: self.inventory.rows,
            unmatched_handles: self.unmatched_handles.clone(),
        }
    }

    /// Write both files into `dir` (created if missing). Returns (products, inventory) paths.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> CuratorResult<(PathBuf, PathBuf)> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .map_err(|e| CuratorError::io(format!("{}: {e}", dir.display())))?;

        let products = write_file(dir, &self.products)?;
        let inventory = write_file(dir, &self.inventory)?;
        tracing::info!(
            products = %products.display(),
            inventory = %inventory.display(),
            "wrote export files"
        );
        Ok((products, inventory))
    }
}

fn write_file(dir: &Path, file: &ExportFile) -> CuratorResult<PathBuf> {
    let path = dir.join(&file.file_name);
    std::fs::write(&path, &file.bytes)
        .map_err(|e| CuratorError::io(format!("{}: {e}", path.display())))?;
    Ok(path)
}

pub fn format_timestamp(now: NaiveDateTime) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// (`selected_products_<ts>.csv`, `selected_inventory_<ts>.csv`)
pub fn export_file_names(timestamp: &str) -> (String, String) {
    (
        format!("selected_products_{timestamp}.csv"),
        format!("selected_inventory_{timestamp}.csv"),
    )
}

/// Derive the selected products and their inventory rows, and serialize both.
///
/// 1. Products whose Handle is selected, in original order with all columns.
/// 2. Their non-empty SKUs.
/// 3. Inventory rows whose SKU is among them, in original order.
///
/// An empty selection gives two header-only files. The result depends only on
/// the inputs and `now`.
pub fn export(
    products: &ProductSet,
    inventory: &InventorySet,
    selection: &BTreeSet<Handle>,
    now: NaiveDateTime,
) -> CuratorResult<ExportBundle> {
    let selected_products: Vec<&ProductRecord> = products
        .records()
        .iter()
        .filter(|p| selection.contains(p.handle()))
        .collect();

    let selected_skus: HashSet<&Sku> = selected_products.iter().filter_map(|p| p.sku()).collect();

    let selected_inventory: Vec<&InventoryRecord> = inventory
        .records()
        .iter()
        .filter(|i| i.sku().is_some_and(|sku| selected_skus.contains(sku)))
        .collect();

    let unmatched_handles: Vec<Handle> = selection
        .iter()
        .filter(|h| !products.contains_handle(h.as_str()))
        .cloned()
        .collect();
    if !unmatched_handles.is_empty() {
        tracing::warn!(
            handles = ?unmatched_handles,
            "selected handles are not in the current product set; ignoring them"
        );
    }

    let timestamp = format_timestamp(now);
    let (products_name, inventory_name) = export_file_names(&timestamp);

    let products_file = ExportFile {
        bytes: write_csv(
            &products_name,
            products.schema(),
            selected_products.iter().map(|p| p.cells()),
        )?,
        file_name: products_name,
        rows: selected_products.len(),
    };
    let inventory_file = ExportFile {
        bytes: write_csv(
            &inventory_name,
            inventory.schema(),
            selected_inventory.iter().map(|i| i.cells()),
        )?,
        file_name: inventory_name,
        rows: selected_inventory.len(),
    };

    tracing::info!(
        timestamp = %timestamp,
        selected = selection.len(),
        product_rows = products_file.rows,
        inventory_rows = inventory_file.rows,
        "export prepared"
    );

    Ok(ExportBundle {
        timestamp,
        products: products_file,
        inventory: inventory_file,
        unmatched_handles,
    })
}

fn write_csv<'a>(
    file_name: &str,
    schema: &RecordSchema,
    rows: impl Iterator<Item = &'a [String]>,
) -> CuratorResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(schema.columns())
        .map_err(|e| CuratorError::csv(file_name, e))?;
    for cells in rows {
        writer
            .write_record(cells)
            .map_err(|e| CuratorError::csv(file_name, e))?;
    }

    writer
        .into_inner()
        .map_err(|e| CuratorError::csv(file_name, e.error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use curator_catalog::{load_inventory, load_products, Upload};

    const PRODUCTS: &str = "Handle,Variant SKU,Title,Image Src,Vendor\n\
        shoe,S1,Shoe,img1,Acme\n\
        shoe,S1-B,,,Acme\n\
        hat,S2,Hat,img2,\"Hats, Inc\"\n\
        plain,,Plain,,\n";

    const INVENTORY: &str = "Variant SKU,Variant Inventory Qty,Location\n\
        S1,5,A\n\
        S2,,B\n\
        S1-B,2,A\n\
        S9,1,C\n";

    fn fixtures() -> (ProductSet, InventorySet) {
        let products = load_products(&[Upload::new("p.csv", PRODUCTS)]).unwrap().products;
        let inventory = load_inventory(&Upload::new("i.csv", INVENTORY)).unwrap();
        (products, inventory)
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 30)
            .unwrap()
    }

    fn selection(handles: &[&str]) -> BTreeSet<Handle> {
        handles.iter().map(|h| Handle::from(*h)).collect()
    }

    fn text(file: &ExportFile) -> &str {
        std::str::from_utf8(&file.bytes).unwrap()
    }

    #[test]
    fn repeated_headers_survive_export() {
        let products = load_products(&[Upload::new(
            "p.csv",
            "Handle,Variant SKU,Title,Image Src,Tag,Tag\nshoe,S1,Shoe,img1,red,blue\n",
        )])
        .unwrap()
        .products;
        let (_, inventory) = fixtures();

        let bundle = export(&products, &inventory, &selection(&["shoe"]), now()).unwrap();
        assert_eq!(
            text(&bundle.products),
            "Handle,Variant SKU,Title,Image Src,Tag,Tag.1\nshoe,S1,Shoe,img1,red,blue\n"
        );
    }

    #[test]
    fn shared_timestamp_names_both_files() {
        let (p, i) = fixtures();
        let bundle = export(&p, &i, &selection(&["shoe"]), now()).unwrap();

        assert_eq!(bundle.timestamp, "20240309_070530");
        assert_eq!(bundle.products.file_name, "selected_products_20240309_070530.csv");
        assert_eq!(bundle.inventory.file_name, "selected_inventory_20240309_070530.csv");
    }

    #[test]
    fn selected_rows_keep_order_and_columns() {
        let (p, i) = fixtures();
        let bundle = export(&p, &i, &selection(&["shoe"]), now()).unwrap();

        assert_eq!(
            text(&bundle.products),
            "Handle,Variant SKU,Title,Image Src,Vendor\n\
             shoe,S1,Shoe,img1,Acme\n\
             shoe,S1-B,,,Acme\n"
        );
        assert_eq!(
            text(&bundle.inventory),
            "Variant SKU,Variant Inventory Qty,Location\n\
             S1,5,A\n\
             S1-B,2,A\n"
        );
        assert_eq!(bundle.products.rows, 2);
        assert_eq!(bundle.inventory.rows, 2);
    }

    #[test]
    fn quoted_cells_round_trip() {
        let (p, i) = fixtures();
        let bundle = export(&p, &i, &selection(&["hat"]), now()).unwrap();

        assert_eq!(
            text(&bundle.products),
            "Handle,Variant SKU,Title,Image Src,Vendor\nhat,S2,Hat,img2,\"Hats, Inc\"\n"
        );
        // Unstocked inventory rows are still exported when their SKU is selected.
        assert_eq!(bundle.inventory.rows, 1);
    }

    #[test]
    fn empty_selection_yields_header_only_files() {
        let (p, i) = fixtures();
        let bundle = export(&p, &i, &BTreeSet::new(), now()).unwrap();

        assert_eq!(text(&bundle.products), "Handle,Variant SKU,Title,Image Src,Vendor\n");
        assert_eq!(text(&bundle.inventory), "Variant SKU,Variant Inventory Qty,Location\n");
        assert_eq!(bundle.products.rows, 0);
        assert_eq!(bundle.inventory.rows, 0);
    }

    #[test]
    fn variantless_product_exports_without_inventory() {
        let (p, i) = fixtures();
        let bundle = export(&p, &i, &selection(&["plain"]), now()).unwrap();

        assert_eq!(bundle.products.rows, 1);
        assert_eq!(bundle.inventory.rows, 0);
    }

    #[test]
    fn stale_handles_are_ignored_and_reported() {
        let (p, i) = fixtures();
        let bundle = export(&p, &i, &selection(&["hat", "retired"]), now()).unwrap();

        assert_eq!(bundle.products.rows, 1);
        assert_eq!(bundle.unmatched_handles, vec![Handle::from("retired")]);
        assert_eq!(bundle.summary().unmatched_handles, vec![Handle::from("retired")]);
    }

    #[test]
    fn export_is_deterministic() {
        let (p, i) = fixtures();
        let s = selection(&["shoe", "hat"]);
        assert_eq!(export(&p, &i, &s, now()).unwrap(), export(&p, &i, &s, now()).unwrap());
    }

    #[test]
    fn write_to_dir_creates_both_files() {
        let (p, i) = fixtures();
        let bundle = export(&p, &i, &selection(&["shoe"]), now()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("exports");
        let (products_path, inventory_path) = bundle.write_to_dir(&out).unwrap();

        assert_eq!(products_path, out.join("selected_products_20240309_070530.csv"));
        assert_eq!(std::fs::read(&products_path).unwrap(), bundle.products.bytes);
        assert_eq!(std::fs::read(&inventory_path).unwrap(), bundle.inventory.bytes);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 300,
                ..ProptestConfig::default()
            })]

            /// Property: exported inventory only references SKUs of exported products,
            /// and exported products only carry selected Handles.
            #[test]
            fn export_stays_inside_selection(
                picks in prop::collection::btree_set("shoe|hat|plain|gone", 0..4)
            ) {
                let (p, i) = fixtures();
                let s: BTreeSet<Handle> = picks.into_iter().map(Handle::from).collect();
                let bundle = export(&p, &i, &s, now()).unwrap();

                let exported_products = load_products(&[Upload::new("out-p.csv", bundle.products.bytes.clone())])
                    .unwrap()
                    .products;
                let exported_inventory = load_inventory(&Upload::new("out-i.csv", bundle.inventory.bytes.clone()))
                    .unwrap();

                prop_assert!(exported_products.records().iter().all(|r| s.contains(r.handle())));

                let skus: HashSet<&Sku> = exported_products.records().iter().filter_map(|r| r.sku()).collect();
                for row in exported_inventory.records() {
                    prop_assert!(row.sku().is_some_and(|sku| skus.contains(sku)));
                }
            }
        }
    }
}
