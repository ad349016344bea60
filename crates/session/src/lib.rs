//! One operator's editing session.
//!
//! `Session` owns the loaded record sets and the selection, and exposes one
//! handler per operator action (`on_products_uploaded`, `on_inventory_uploaded`,
//! `on_toggle`, `on_export`) plus `render`. Derived views are recomputed only
//! when the record sets they were built from are replaced.

pub mod presenter;
pub mod selection;
pub mod session;
pub mod store;

pub use presenter::{Notice, Presenter};
pub use selection::{SelectionStore, SELECTION_KEY};
pub use session::{CatalogView, Session, UploadReceipt};
pub use store::{InMemorySessionStore, SessionStore};
