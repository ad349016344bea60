//! Curation error model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the curation pipeline.
pub type CuratorResult<T> = Result<T, CuratorError>;

/// Which record set has not been loaded yet.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingInput {
    Products,
    Inventory,
    Both,
}

impl MissingInput {
    /// Combine "is loaded" flags into a missing-input marker, if anything is missing.
    pub fn from_loaded(products: bool, inventory: bool) -> Option<Self> {
        match (products, inventory) {
            (true, true) => None,
            (false, true) => Some(Self::Products),
            (true, false) => Some(Self::Inventory),
            (false, false) => Some(Self::Both),
        }
    }
}

impl core::fmt::Display for MissingInput {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MissingInput::Products => f.write_str("product data"),
            MissingInput::Inventory => f.write_str("inventory data"),
            MissingInput::Both => f.write_str("product and inventory data"),
        }
    }
}

/// Curation error.
///
/// Every variant is local to one upload or one operator action; none of them
/// leave already-loaded state half-updated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CuratorError {
    /// An uploaded file lacks a required column.
    #[error("{source_name}: required column '{column}' not found")]
    Schema { source_name: String, column: String },

    /// A computation was requested before its inputs were loaded.
    #[error("no {0} loaded yet")]
    EmptyInput(MissingInput),

    /// A file could not be parsed as CSV.
    #[error("{source_name}: could not read CSV: {message}")]
    Csv { source_name: String, message: String },

    /// A Handle was selected that no row of the current product set carries.
    #[error("unknown handle '{0}'")]
    UnknownHandle(String),

    /// None of the uploaded product files could be read.
    #[error("no valid product files could be read")]
    NoReadableFiles,

    /// Filesystem failure reading uploads or writing exports.
    #[error("io error: {0}")]
    Io(String),

    /// The session store held a value of an unexpected shape.
    #[error("session store: {0}")]
    Session(String),
}

impl CuratorError {
    pub fn schema(source_name: impl Into<String>, column: impl Into<String>) -> Self {
        Self::Schema {
            source_name: source_name.into(),
            column: column.into(),
        }
    }

    pub fn csv(source_name: impl Into<String>, message: impl core::fmt::Display) -> Self {
        Self::Csv {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    pub fn empty_input(missing: MissingInput) -> Self {
        Self::EmptyInput(missing)
    }

    pub fn io(msg: impl core::fmt::Display) -> Self {
        Self::Io(msg.to_string())
    }

    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_from_flags() {
        assert_eq!(MissingInput::from_loaded(true, true), None);
        assert_eq!(MissingInput::from_loaded(false, true), Some(MissingInput::Products));
        assert_eq!(MissingInput::from_loaded(true, false), Some(MissingInput::Inventory));
        assert_eq!(MissingInput::from_loaded(false, false), Some(MissingInput::Both));
    }

    #[test]
    fn schema_error_names_file_and_column() {
        let err = CuratorError::schema("products.csv", "Handle");
        assert_eq!(err.to_string(), "products.csv: required column 'Handle' not found");
    }

    #[test]
    fn empty_input_names_missing_set() {
        let err = CuratorError::empty_input(MissingInput::Inventory);
        assert_eq!(err.to_string(), "no inventory data loaded yet");
    }
}
