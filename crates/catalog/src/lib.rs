//! Catalog reconciliation: record loading, the SKU left join, and Handle grouping.
//!
//! Everything here is a pure in-memory transformation; the only IO is reading
//! upload bytes (supplied by the caller) and, optionally, files from disk.

pub mod group;
pub mod loader;
pub mod merge;
pub mod record;
pub mod schema;

pub use group::{group, ProductGroup, VariantStock};
pub use loader::{load_inventory, load_products, ProductLoad, SkippedFile, Upload};
pub use merge::{merge, MergeOutcome, MergedRecord};
pub use record::{InventoryRecord, InventorySet, ProductRecord, ProductSet};
pub use schema::RecordSchema;
