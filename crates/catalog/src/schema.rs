//! Column schemas for product and inventory files.

use curator_core::{CuratorError, CuratorResult};

pub const HANDLE: &str = "Handle";
pub const VARIANT_SKU: &str = "Variant SKU";
pub const TITLE: &str = "Title";
pub const IMAGE_SRC: &str = "Image Src";
pub const VARIANT_INVENTORY_QTY: &str = "Variant Inventory Qty";

/// Columns every product file must carry.
pub const PRODUCT_COLUMNS: [&str; 4] = [HANDLE, VARIANT_SKU, TITLE, IMAGE_SRC];

/// Columns every inventory file must carry.
pub const INVENTORY_COLUMNS: [&str; 2] = [VARIANT_SKU, VARIANT_INVENTORY_QTY];

/// Ordered header row of a record set.
///
/// Exports reuse it verbatim, so columns are never added, dropped or reordered
/// after load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSchema {
    columns: Vec<String>,
}

impl RecordSchema {
    /// Build a schema from raw header names (surrounding whitespace is stripped).
    ///
    /// A repeated name is kept as its own column under `name.1`, `name.2`, ...
    /// so every cell of the file still has a column to live in.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut schema = Self::default();
        for raw in columns {
            let name = normalize_header(raw.as_ref());
            let name = schema.unused_name(name);
            schema.columns.push(name);
        }
        schema
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of the first column with this exact name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Position of a required column, or a `Schema` error naming the source file.
    pub fn require(&self, source_name: &str, name: &str) -> CuratorResult<usize> {
        self.position(name)
            .ok_or_else(|| CuratorError::schema(source_name, name))
    }

    /// Check that every required column is present (first missing column wins).
    pub fn validate(&self, source_name: &str, required: &[&str]) -> CuratorResult<()> {
        for column in required {
            self.require(source_name, column)?;
        }
        Ok(())
    }

    fn unused_name(&self, name: String) -> String {
        if self.position(&name).is_none() {
            return name;
        }
        let mut n = 1;
        loop {
            let candidate = format!("{name}.{n}");
            if self.position(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }

    /// Append the columns of `other` this schema does not have yet, in their order.
    pub fn extend_union(&mut self, other: &RecordSchema) {
        for column in &other.columns {
            if self.position(column).is_none() {
                self.columns.push(column.clone());
            }
        }
    }
}

/// Header cells are compared after trimming surrounding whitespace.
pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_trimmed() {
        let schema = RecordSchema::new([" Handle", "Variant SKU  ", "Title"]);
        assert_eq!(schema.columns(), &["Handle", "Variant SKU", "Title"]);
        assert_eq!(schema.position("Variant SKU"), Some(1));
    }

    #[test]
    fn validate_reports_first_missing_column() {
        let schema = RecordSchema::new(["Handle", "Title"]);
        let err = schema.validate("a.csv", &PRODUCT_COLUMNS).unwrap_err();
        assert_eq!(err, CuratorError::schema("a.csv", VARIANT_SKU));
    }

    #[test]
    fn column_match_is_case_sensitive() {
        let schema = RecordSchema::new(["variant sku", "Variant Inventory Qty"]);
        assert!(schema.validate("inv.csv", &INVENTORY_COLUMNS).is_err());
    }

    #[test]
    fn repeated_headers_are_numbered() {
        let schema = RecordSchema::new(["Handle", "Tag", "Tag ", "Tag.1", "Tag"]);
        assert_eq!(schema.columns(), &["Handle", "Tag", "Tag.1", "Tag.1.1", "Tag.2"]);
    }

    #[test]
    fn union_keeps_first_seen_order() {
        let mut schema = RecordSchema::new(["Handle", "Title"]);
        schema.extend_union(&RecordSchema::new(["Title", "Vendor", "Handle", "Tags"]));
        assert_eq!(schema.columns(), &["Handle", "Title", "Vendor", "Tags"]);
    }
}
