//! `curator-core`: shared building blocks for catalog curation.
//!
//! Identifiers and the error model used by every other crate. No IO lives here.

pub mod error;
pub mod id;

pub use error::{CuratorError, CuratorResult, MissingInput};
pub use id::{Handle, Sku, UploadId};
