//! Exporter: filters the catalog down to the selected Handles and serializes
//! both record sets to CSV.

pub mod exporter;

pub use exporter::{export, export_file_names, format_timestamp, ExportBundle, ExportFile, ExportSummary};
