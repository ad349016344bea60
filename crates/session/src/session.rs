use chrono::NaiveDateTime;

use curator_catalog::{
    group, load_inventory, load_products, merge, InventorySet, ProductGroup, ProductSet, SkippedFile, Upload,
};
use curator_core::{CuratorError, CuratorResult, Handle, MissingInput, Sku, UploadId};
use curator_export::{export, ExportBundle};

use crate::presenter::{Notice, Presenter};
use crate::selection::SelectionStore;
use crate::store::SessionStore;

/// A record set together with the identity of the upload that produced it.
#[derive(Debug)]
struct Loaded<T> {
    id: UploadId,
    records: T,
}

/// Merged and grouped view of the current record sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogView {
    products_id: UploadId,
    inventory_id: UploadId,
    groups: Vec<ProductGroup>,
    merged_rows: usize,
    duplicate_skus: Vec<Sku>,
}

impl CatalogView {
    /// Upload identities this view was derived from.
    pub fn key(&self) -> (UploadId, UploadId) {
        (self.products_id, self.inventory_id)
    }

    pub fn groups(&self) -> &[ProductGroup] {
        &self.groups
    }

    pub fn merged_rows(&self) -> usize {
        self.merged_rows
    }

    pub fn duplicate_skus(&self) -> &[Sku] {
        &self.duplicate_skus
    }
}

/// What an accepted upload replaced the record set with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub id: UploadId,
    pub rows: usize,
    pub skipped: Vec<SkippedFile>,
}

/// One operator's editing session.
///
/// Owns the loaded record sets, the selection and the cached view. Each
/// operator action is one `&mut self` call; nothing is shared or global.
#[derive(Debug)]
pub struct Session<S: SessionStore> {
    products: Option<Loaded<ProductSet>>,
    inventory: Option<Loaded<InventorySet>>,
    selection: SelectionStore<S>,
    view: Option<CatalogView>,
    notices: Vec<Notice>,
}

impl<S: SessionStore> Session<S> {
    /// Start a session; any selection already held by `store` is picked up.
    pub fn new(store: S) -> CuratorResult<Self> {
        Ok(Self {
            products: None,
            inventory: None,
            selection: SelectionStore::open(store)?,
            view: None,
            notices: Vec::new(),
        })
    }

    pub fn products(&self) -> Option<&ProductSet> {
        self.products.as_ref().map(|l| &l.records)
    }

    pub fn inventory(&self) -> Option<&InventorySet> {
        self.inventory.as_ref().map(|l| &l.records)
    }

    pub fn selection(&self) -> &SelectionStore<S> {
        &self.selection
    }

    /// Which inputs are still missing, if any.
    pub fn missing_input(&self) -> Option<MissingInput> {
        MissingInput::from_loaded(self.products.is_some(), self.inventory.is_some())
    }

    /// Replace the product record set with the concatenation of `uploads`.
    ///
    /// On error the previous product set (if any) stays active.
    pub fn on_products_uploaded(&mut self, uploads: &[Upload]) -> CuratorResult<UploadReceipt> {
        let load = match load_products(uploads) {
            Ok(load) => load,
            Err(err) => return Err(self.reject_upload(err)),
        };

        for skipped in &load.skipped {
            self.notices.push(Notice::FileSkipped(skipped.clone()));
        }

        let id = UploadId::new();
        let receipt = UploadReceipt {
            id,
            rows: load.products.len(),
            skipped: load.skipped,
        };
        self.products = Some(Loaded {
            id,
            records: load.products,
        });

        let stale = self.stale_selections();
        tracing::info!(upload_id = %id, rows = receipt.rows, stale_selections = stale.len(), "product set replaced");
        Ok(receipt)
    }

    /// Replace the inventory record set.
    ///
    /// On error the previous inventory set (if any) stays active.
    pub fn on_inventory_uploaded(&mut self, upload: &Upload) -> CuratorResult<UploadReceipt> {
        let inventory = match load_inventory(upload) {
            Ok(inventory) => inventory,
            Err(err) => return Err(self.reject_upload(err)),
        };

        let id = UploadId::new();
        let receipt = UploadReceipt {
            id,
            rows: inventory.len(),
            skipped: Vec::new(),
        };
        self.inventory = Some(Loaded {
            id,
            records: inventory,
        });

        tracing::info!(upload_id = %id, rows = receipt.rows, "inventory set replaced");
        Ok(receipt)
    }

    /// Set whether `handle` is selected. Returns whether the selection changed.
    ///
    /// Selecting requires the Handle to exist in the current product set;
    /// deselecting always succeeds, so stale handles can be dropped.
    pub fn on_toggle(&mut self, handle: impl Into<Handle>, selected: bool) -> CuratorResult<bool> {
        let handle = handle.into();
        if selected {
            let products = self
                .products()
                .ok_or_else(|| CuratorError::empty_input(MissingInput::Products))?;
            if !products.contains_handle(handle.as_str()) {
                return Err(CuratorError::UnknownHandle(handle.into_inner()));
            }
        }

        let changed = self.selection.toggle(handle.clone(), selected)?;
        tracing::debug!(handle = %handle, selected, changed, "selection toggled");
        Ok(changed)
    }

    /// Drop every selected Handle.
    pub fn clear_selection(&mut self) -> CuratorResult<()> {
        self.selection.clear()
    }

    /// Selected Handles that the current product set no longer carries.
    pub fn stale_selections(&self) -> Vec<Handle> {
        match self.products() {
            Some(products) => self
                .selection
                .all()
                .iter()
                .filter(|h| !products.contains_handle(h.as_str()))
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    /// Export the current selection against the current record sets.
    pub fn on_export(&self, now: NaiveDateTime) -> CuratorResult<ExportBundle> {
        let (products, inventory) = self.loaded()?;
        export(
            &products.records,
            &inventory.records,
            self.selection.all(),
            now,
        )
    }

    /// Merged/grouped view of the current record sets, recomputed only when
    /// either set has been replaced since the last call.
    pub fn view(&mut self) -> CuratorResult<&CatalogView> {
        self.refresh_view()?;
        self.view
            .as_ref()
            .ok_or_else(|| CuratorError::empty_input(MissingInput::Both))
    }

    /// Render the current state: pending notices first, then the groups (or a
    /// prompt when inputs are missing).
    pub fn render<P: Presenter + ?Sized>(&mut self, presenter: &mut P) -> CuratorResult<()> {
        let refreshed = self.refresh_view();

        for notice in self.notices.drain(..) {
            presenter.notify(&notice);
        }

        match refreshed {
            Ok(()) => {}
            Err(CuratorError::EmptyInput(missing)) => {
                presenter.prompt(missing);
                return Ok(());
            }
            Err(err) => return Err(err),
        }

        if let Some(view) = &self.view {
            let selection = &self.selection;
            presenter.render(view.groups(), &|h: &Handle| selection.contains(h.as_str()));
        }
        Ok(())
    }

    fn loaded(&self) -> CuratorResult<(&Loaded<ProductSet>, &Loaded<InventorySet>)> {
        match (&self.products, &self.inventory) {
            (Some(p), Some(i)) => Ok((p, i)),
            _ => Err(CuratorError::empty_input(
                self.missing_input().unwrap_or(MissingInput::Both),
            )),
        }
    }

    fn refresh_view(&mut self) -> CuratorResult<()> {
        let (products, inventory) = match (&self.products, &self.inventory) {
            (Some(p), Some(i)) => (p, i),
            _ => {
                self.view = None;
                return Err(CuratorError::empty_input(
                    self.missing_input().unwrap_or(MissingInput::Both),
                ));
            }
        };

        let key = (products.id, inventory.id);
        if self.view.as_ref().is_some_and(|v| v.key() == key) {
            tracing::debug!("reusing cached catalog view");
            return Ok(());
        }

        let outcome = merge(&products.records, &inventory.records);
        let groups = group(&outcome.records);
        tracing::info!(
            merged_rows = outcome.len(),
            groups = groups.len(),
            duplicate_skus = outcome.duplicate_skus.len(),
            "catalog view rebuilt"
        );

        if !outcome.duplicate_skus.is_empty() {
            self.notices
                .push(Notice::DuplicateSkus(outcome.duplicate_skus.clone()));
        }

        self.view = Some(CatalogView {
            products_id: key.0,
            inventory_id: key.1,
            merged_rows: outcome.len(),
            groups,
            duplicate_skus: outcome.duplicate_skus,
        });
        Ok(())
    }

    fn reject_upload(&mut self, err: CuratorError) -> CuratorError {
        tracing::warn!(error = %err, "upload rejected; keeping previously loaded data");
        self.notices.push(Notice::UploadRejected(err.clone()));
        err
    }
}
