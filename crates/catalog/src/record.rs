//! Typed product and inventory record sets.
//!
//! A record keeps its typed key fields next to the full row of raw cells, so
//! export can write every column back out unchanged.

use curator_core::{CuratorResult, Handle, Sku};

use crate::schema::{
    RecordSchema, HANDLE, IMAGE_SRC, INVENTORY_COLUMNS, PRODUCT_COLUMNS, TITLE, VARIANT_INVENTORY_QTY,
    VARIANT_SKU,
};

/// One product row: one (Handle, Variant SKU) combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    handle: Handle,
    sku: Option<Sku>,
    title: String,
    image_src: Option<String>,
    cells: Vec<String>,
}

impl ProductRecord {
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// `None` for a row without a variant (empty SKU cell).
    pub fn sku(&self) -> Option<&Sku> {
        self.sku.as_ref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn image_src(&self) -> Option<&str> {
        self.image_src.as_deref()
    }

    /// Raw cells in schema column order.
    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}

/// One inventory row, keyed by Variant SKU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryRecord {
    sku: Option<Sku>,
    quantity: Option<u64>,
    cells: Vec<String>,
}

impl InventoryRecord {
    pub fn sku(&self) -> Option<&Sku> {
        self.sku.as_ref()
    }

    /// `None` when the quantity cell is empty or not a non-negative integer.
    pub fn quantity(&self) -> Option<u64> {
        self.quantity
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}

/// The full product catalog, possibly concatenated from several files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSet {
    schema: RecordSchema,
    records: Vec<ProductRecord>,
}

impl ProductSet {
    /// Build from a schema and raw rows. Rows are padded or truncated to the schema width.
    ///
    /// Fails with `Schema` if a required product column is missing.
    pub fn from_rows(
        source_name: &str,
        schema: RecordSchema,
        rows: impl IntoIterator<Item = Vec<String>>,
    ) -> CuratorResult<Self> {
        schema.validate(source_name, &PRODUCT_COLUMNS)?;
        let handle_at = schema.require(source_name, HANDLE)?;
        let sku_at = schema.require(source_name, VARIANT_SKU)?;
        let title_at = schema.require(source_name, TITLE)?;
        let image_at = schema.require(source_name, IMAGE_SRC)?;

        let width = schema.len();
        let records = rows
            .into_iter()
            .map(|mut cells| {
                cells.resize(width, String::new());
                let image = &cells[image_at];
                ProductRecord {
                    handle: Handle::new(cells[handle_at].clone()),
                    sku: Sku::from_cell(&cells[sku_at]),
                    title: cells[title_at].clone(),
                    image_src: (!image.is_empty()).then(|| image.clone()),
                    cells,
                }
            })
            .collect();

        Ok(Self { schema, records })
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether any row carries this Handle.
    pub fn contains_handle(&self, handle: &str) -> bool {
        self.records.iter().any(|r| r.handle.as_str() == handle)
    }
}

/// The inventory ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySet {
    schema: RecordSchema,
    records: Vec<InventoryRecord>,
}

impl InventorySet {
    /// Build from a schema and raw rows. Rows are padded or truncated to the schema width.
    ///
    /// Fails with `Schema` if a required inventory column is missing.
    pub fn from_rows(
        source_name: &str,
        schema: RecordSchema,
        rows: impl IntoIterator<Item = Vec<String>>,
    ) -> CuratorResult<Self> {
        schema.validate(source_name, &INVENTORY_COLUMNS)?;
        let sku_at = schema.require(source_name, VARIANT_SKU)?;
        let qty_at = schema.require(source_name, VARIANT_INVENTORY_QTY)?;

        let width = schema.len();
        let records = rows
            .into_iter()
            .map(|mut cells| {
                cells.resize(width, String::new());
                let quantity = parse_quantity(&cells[qty_at]);
                if quantity.is_none() && !cells[qty_at].trim().is_empty() {
                    tracing::warn!(
                        source = source_name,
                        sku = %cells[sku_at],
                        value = %cells[qty_at],
                        "unparseable inventory quantity; treating as missing"
                    );
                }
                InventoryRecord {
                    sku: Sku::from_cell(&cells[sku_at]),
                    quantity,
                    cells,
                }
            })
            .collect();

        Ok(Self { schema, records })
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn records(&self) -> &[InventoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse an inventory quantity cell.
///
/// Accepts non-negative integers, including integral decimal spellings like `5.0`
/// that spreadsheet exports tend to produce.
pub fn parse_quantity(cell: &str) -> Option<u64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    if let Ok(n) = cell.parse::<u64>() {
        return Some(n);
    }
    match cell.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Some(f as u64),
        _ => None,
    }
}
