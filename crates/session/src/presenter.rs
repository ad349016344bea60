//! Boundary to the Presentation Layer.

use curator_catalog::{ProductGroup, SkippedFile};
use curator_core::{CuratorError, Handle, MissingInput, Sku};

/// Something the operator should see besides the product groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A product file was left out of a concatenated upload.
    FileSkipped(SkippedFile),
    /// An upload was rejected; the previously loaded data is still active.
    UploadRejected(CuratorError),
    /// Inventory carries several rows for these SKUs; merged rows were fanned out.
    DuplicateSkus(Vec<Sku>),
}

/// Renders derived views and collects operator input.
///
/// The session calls into it; the presenter calls back into the session
/// (`on_toggle`, `on_export`) between renders.
pub trait Presenter {
    /// Show every product group, with a lookup for the current selection state.
    fn render(&mut self, groups: &[ProductGroup], is_selected: &dyn Fn(&Handle) -> bool);

    /// Show the empty/prompt state: inputs are not loaded yet.
    fn prompt(&mut self, missing: MissingInput);

    fn notify(&mut self, _notice: &Notice) {}
}
