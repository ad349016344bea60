//! Record Loader: turns uploaded CSV bytes into typed record sets.

use std::io::Cursor;
use std::path::Path;

use curator_core::{CuratorError, CuratorResult};
use serde::{Deserialize, Serialize};

use crate::record::{InventorySet, ProductSet};
use crate::schema::{RecordSchema, PRODUCT_COLUMNS};

/// UTF-8 BOM bytes.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// One uploaded file: a display name plus its raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    name: String,
    bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read an upload from disk; the file name becomes the display name.
    pub fn from_path(path: impl AsRef<Path>) -> CuratorResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| CuratorError::io(format!("{}: {e}", path.display())))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// A product file that was left out of a concatenated upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub name: String,
    pub reason: String,
}

/// Result of loading a batch of product files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductLoad {
    pub products: ProductSet,
    /// Files that could not be parsed and were left out.
    pub skipped: Vec<SkippedFile>,
}

/// Header row plus data rows of one parsed file, each row at header width.
#[derive(Debug)]
struct RawTable {
    schema: RecordSchema,
    rows: Vec<Vec<String>>,
}

fn read_table(upload: &Upload) -> CuratorResult<RawTable> {
    let data = upload
        .bytes
        .strip_prefix(UTF8_BOM)
        .unwrap_or(upload.bytes.as_slice());

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(Cursor::new(data));

    let schema = match reader.headers() {
        Ok(h) if h.iter().all(|c| c.trim().is_empty()) => {
            return Err(CuratorError::csv(&upload.name, "no header row"));
        }
        Ok(h) => RecordSchema::new(h.iter()),
        Err(e) => return Err(CuratorError::csv(&upload.name, e)),
    };

    let width = schema.len();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| CuratorError::csv(&upload.name, e))?;
        let mut cells: Vec<String> = record.iter().map(String::from).collect();
        cells.resize(width, String::new());
        rows.push(cells);
    }

    Ok(RawTable { schema, rows })
}

/// Load and concatenate product files (row-wise union, no deduplication).
///
/// - Files that fail to parse are skipped with a warning; the rest still load.
/// - If no file can be read, fails with `NoReadableFiles`.
/// - If any readable file lacks a required column, the whole batch is rejected
///   with `Schema`.
/// - Files with different column sets are merged on the ordered union of their
///   headers; cells a file does not have are left empty.
pub fn load_products(uploads: &[Upload]) -> CuratorResult<ProductLoad> {
    let mut tables = Vec::with_capacity(uploads.len());
    let mut skipped = Vec::new();

    for upload in uploads {
        match read_table(upload) {
            Ok(table) => tables.push((upload.name(), table)),
            Err(err) => {
                tracing::warn!(file = upload.name(), error = %err, "could not read product file; skipping");
                skipped.push(SkippedFile {
                    name: upload.name().to_string(),
                    reason: err.to_string(),
                });
            }
        }
    }

    if tables.is_empty() {
        return Err(CuratorError::NoReadableFiles);
    }

    let mut schema = RecordSchema::default();
    for (name, table) in &tables {
        table.schema.validate(name, &PRODUCT_COLUMNS)?;
        schema.extend_union(&table.schema);
    }

    let width = schema.len();
    let mut rows = Vec::new();
    for (_, table) in tables {
        let mapping: Vec<Option<usize>> = table
            .schema
            .columns()
            .iter()
            .map(|column| schema.position(column))
            .collect();

        for cells in table.rows {
            let mut out = vec![String::new(); width];
            for (cell, target) in cells.into_iter().zip(&mapping) {
                if let Some(at) = target {
                    out[*at] = cell;
                }
            }
            rows.push(out);
        }
    }

    let source_name = uploads
        .iter()
        .map(Upload::name)
        .collect::<Vec<_>>()
        .join(", ");
    let products = ProductSet::from_rows(&source_name, schema, rows)?;

    tracing::info!(
        files = uploads.len() - skipped.len(),
        skipped = skipped.len(),
        rows = products.len(),
        "loaded product files"
    );

    Ok(ProductLoad { products, skipped })
}

/// Load a single inventory file.
pub fn load_inventory(upload: &Upload) -> CuratorResult<InventorySet> {
    let table = read_table(upload)?;
    let inventory = InventorySet::from_rows(upload.name(), table.schema, table.rows)?;
    tracing::info!(file = upload.name(), rows = inventory.len(), "loaded inventory file");
    Ok(inventory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_core::Sku;

    const PRODUCTS: &str = "Handle,Variant SKU,Title,Image Src\n\
        shoe,S1,Shoe,img1\n\
        shoe,S1-B,,\n\
        hat,S2,Hat,img2\n";

    #[test]
    fn loads_inventory_with_bom_and_padded_headers() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b" Variant SKU , Variant Inventory Qty\nS1,5\n");
        let inv = load_inventory(&Upload::new("inv.csv", bytes)).unwrap();

        assert_eq!(inv.schema().columns(), &["Variant SKU", "Variant Inventory Qty"]);
        assert_eq!(inv.records()[0].sku(), Some(&Sku::new("S1")));
        assert_eq!(inv.records()[0].quantity(), Some(5));
    }

    #[test]
    fn cell_values_are_not_trimmed() {
        let inv = load_inventory(&Upload::new(
            "inv.csv",
            "Variant SKU,Variant Inventory Qty\n S1 ,5\n",
        ))
        .unwrap();
        assert_eq!(inv.records()[0].sku(), Some(&Sku::new(" S1 ")));
    }

    #[test]
    fn inventory_without_qty_column_is_a_schema_error() {
        let err = load_inventory(&Upload::new("inv.csv", "Variant SKU\nS1\n")).unwrap_err();
        assert_eq!(err, CuratorError::schema("inv.csv", "Variant Inventory Qty"));
    }

    #[test]
    fn concatenates_product_files_in_order() {
        let second = "Handle,Variant SKU,Title,Image Src\nsock,S3,Sock,img3\n";
        let load = load_products(&[
            Upload::new("a.csv", PRODUCTS),
            Upload::new("b.csv", second),
        ])
        .unwrap();

        let handles: Vec<_> = load
            .products
            .records()
            .iter()
            .map(|r| r.handle().as_str())
            .collect();
        assert_eq!(handles, vec!["shoe", "shoe", "hat", "sock"]);
        assert!(load.skipped.is_empty());
    }

    #[test]
    fn concatenation_unions_columns() {
        let first = "Handle,Variant SKU,Title,Image Src,Vendor\nshoe,S1,Shoe,img1,Acme\n";
        let second = "Title,Handle,Image Src,Variant SKU,Tags\nHat,hat,img2,S2,summer\n";
        let load = load_products(&[Upload::new("a.csv", first), Upload::new("b.csv", second)]).unwrap();

        let products = &load.products;
        assert_eq!(
            products.schema().columns(),
            &["Handle", "Variant SKU", "Title", "Image Src", "Vendor", "Tags"]
        );
        assert_eq!(products.records()[0].cells(), &["shoe", "S1", "Shoe", "img1", "Acme", ""]);
        assert_eq!(products.records()[1].cells(), &["hat", "S2", "Hat", "img2", "", "summer"]);
    }

    #[test]
    fn unreadable_product_file_is_skipped() {
        let load = load_products(&[
            Upload::new("broken.csv", vec![0xFF, 0xFE, b'\n', 0xFF]),
            Upload::new("a.csv", PRODUCTS),
        ])
        .unwrap();

        assert_eq!(load.products.len(), 3);
        assert_eq!(load.skipped.len(), 1);
        assert_eq!(load.skipped[0].name, "broken.csv");
    }

    #[test]
    fn empty_product_file_is_skipped() {
        let load = load_products(&[Upload::new("empty.csv", ""), Upload::new("a.csv", PRODUCTS)]).unwrap();

        assert_eq!(load.products.len(), 3);
        assert_eq!(load.skipped.len(), 1);
        assert_eq!(load.skipped[0].name, "empty.csv");

        let err = load_products(&[Upload::new("blank.csv", "\n\n")]).unwrap_err();
        assert_eq!(err, CuratorError::NoReadableFiles);
    }

    #[test]
    fn empty_inventory_file_is_a_csv_error() {
        let err = load_inventory(&Upload::new("inv.csv", "")).unwrap_err();
        assert_eq!(err, CuratorError::csv("inv.csv", "no header row"));
    }

    #[test]
    fn repeated_product_headers_keep_every_cell() {
        let load = load_products(&[
            Upload::new("a.csv", "Handle,Variant SKU,Title,Image Src,Tag,Tag\nshoe,S1,Shoe,img1,red,blue\n"),
            Upload::new("b.csv", "Handle,Variant SKU,Title,Image Src,Tag\nhat,S2,Hat,img2,green\n"),
        ])
        .unwrap();

        let products = &load.products;
        assert_eq!(
            products.schema().columns(),
            &["Handle", "Variant SKU", "Title", "Image Src", "Tag", "Tag.1"]
        );
        assert_eq!(products.records()[0].cells(), &["shoe", "S1", "Shoe", "img1", "red", "blue"]);
        assert_eq!(products.records()[1].cells(), &["hat", "S2", "Hat", "img2", "green", ""]);
    }

    #[test]
    fn repeated_inventory_headers_keep_every_cell() {
        let inv = load_inventory(&Upload::new(
            "inv.csv",
            "Variant SKU,Variant Inventory Qty,Bin,Bin\nS1,5,A,B\n",
        ))
        .unwrap();
        assert_eq!(
            inv.schema().columns(),
            &["Variant SKU", "Variant Inventory Qty", "Bin", "Bin.1"]
        );
        assert_eq!(inv.records()[0].cells(), &["S1", "5", "A", "B"]);
    }

    #[test]
    fn no_readable_product_files() {
        let err = load_products(&[Upload::new("broken.csv", vec![0xFF, 0xFE, b'\n'])]).unwrap_err();
        assert_eq!(err, CuratorError::NoReadableFiles);

        let err = load_products(&[]).unwrap_err();
        assert_eq!(err, CuratorError::NoReadableFiles);
    }

    #[test]
    fn one_file_missing_a_column_rejects_the_batch() {
        let bad = "Handle,Title,Image Src\nsock,Sock,img3\n";
        let err = load_products(&[Upload::new("a.csv", PRODUCTS), Upload::new("bad.csv", bad)]).unwrap_err();
        assert_eq!(err, CuratorError::schema("bad.csv", "Variant SKU"));
    }

    #[test]
    fn ragged_rows_are_padded() {
        let load = load_products(&[Upload::new(
            "a.csv",
            "Handle,Variant SKU,Title,Image Src\nshoe,S1\n",
        )])
        .unwrap();
        let record = &load.products.records()[0];
        assert_eq!(record.title(), "");
        assert_eq!(record.image_src(), None);
    }
}
