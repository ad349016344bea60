//! Selection Store: the operator's set of chosen Handles.

use std::collections::BTreeSet;

use curator_core::{CuratorError, CuratorResult, Handle};

use crate::store::SessionStore;

/// Session-store key holding the selection (a JSON array of handle strings).
pub const SELECTION_KEY: &str = "selection";

/// Set of selected Handles, written through to a [`SessionStore`] on every change.
///
/// Membership is kept by Handle value, so it survives record-set replacement.
#[derive(Debug)]
pub struct SelectionStore<S: SessionStore> {
    store: S,
    handles: BTreeSet<Handle>,
}

impl<S: SessionStore> SelectionStore<S> {
    /// Open the selection persisted in `store` (empty if none was saved yet).
    pub fn open(store: S) -> CuratorResult<Self> {
        let handles = match store.get(SELECTION_KEY) {
            None => BTreeSet::new(),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                CuratorError::session(format!("'{SELECTION_KEY}' is not a list of handles: {e}"))
            })?,
        };
        Ok(Self { store, handles })
    }

    /// Set membership of `handle`. Returns whether anything changed.
    pub fn toggle(&mut self, handle: Handle, selected: bool) -> CuratorResult<bool> {
        let changed = if selected {
            self.handles.insert(handle)
        } else {
            self.handles.remove(&handle)
        };
        if changed {
            self.persist()?;
        }
        Ok(changed)
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.handles.contains(handle)
    }

    pub fn all(&self) -> &BTreeSet<Handle> {
        &self.handles
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn clear(&mut self) -> CuratorResult<()> {
        if self.handles.is_empty() {
            return Ok(());
        }
        self.handles.clear();
        self.persist()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn persist(&mut self) -> CuratorResult<()> {
        let value = serde_json::to_value(&self.handles)
            .map_err(|e| CuratorError::session(format!("could not encode selection: {e}")))?;
        self.store.set(SELECTION_KEY, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemorySessionStore;
    use serde_json::json;

    fn handle(h: &str) -> Handle {
        Handle::from(h)
    }

    #[test]
    fn toggle_sets_membership() {
        let mut selection = SelectionStore::open(InMemorySessionStore::new()).unwrap();

        assert!(selection.toggle(handle("shoe"), true).unwrap());
        assert!(selection.contains("shoe"));
        assert!(!selection.contains("hat"));

        assert!(selection.toggle(handle("shoe"), false).unwrap());
        assert!(!selection.contains("shoe"));
        assert!(selection.is_empty());
    }

    #[test]
    fn repeated_toggle_is_a_no_op() {
        let mut selection = SelectionStore::open(InMemorySessionStore::new()).unwrap();

        assert!(selection.toggle(handle("shoe"), true).unwrap());
        assert!(!selection.toggle(handle("shoe"), true).unwrap());
        assert!(selection.contains("shoe"));
        assert_eq!(selection.len(), 1);

        assert!(!selection.toggle(handle("hat"), false).unwrap());
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn selection_is_written_through_and_reopened() {
        let mut store = InMemorySessionStore::new();
        {
            let mut selection = SelectionStore::open(&mut store).unwrap();
            selection.toggle(handle("shoe"), true).unwrap();
            selection.toggle(handle("hat"), true).unwrap();
        }
        assert_eq!(store.get(SELECTION_KEY), Some(json!(["hat", "shoe"])));

        let reopened = SelectionStore::open(store).unwrap();
        let all: Vec<_> = reopened.all().iter().map(Handle::as_str).collect();
        assert_eq!(all, vec!["hat", "shoe"]);
    }

    #[test]
    fn malformed_stored_selection_is_rejected() {
        let mut store = InMemorySessionStore::new();
        store.set(SELECTION_KEY, json!({"shoe": true}));
        let err = SelectionStore::open(store).unwrap_err();
        assert!(matches!(err, CuratorError::Session(_)));
    }

    #[test]
    fn clear_empties_the_store() {
        let mut selection = SelectionStore::open(InMemorySessionStore::new()).unwrap();
        selection.toggle(handle("shoe"), true).unwrap();
        selection.clear().unwrap();

        assert!(selection.is_empty());
        assert_eq!(selection.store().get(SELECTION_KEY), Some(json!([])));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 300,
                ..ProptestConfig::default()
            })]

            /// Property: the store behaves like a set under any toggle sequence,
            /// and what it persists matches what it reports.
            #[test]
            fn toggles_match_a_model_set(ops in prop::collection::vec(("[a-e]", any::<bool>()), 0..40)) {
                let mut selection = SelectionStore::open(InMemorySessionStore::new()).unwrap();
                let mut model = BTreeSet::new();

                for (h, on) in ops {
                    let expected_change = if on { model.insert(h.clone()) } else { model.remove(&h) };
                    prop_assert_eq!(selection.toggle(Handle::from(h), on).unwrap(), expected_change);
                }

                let actual: BTreeSet<String> = selection.all().iter().map(|h| h.to_string()).collect();
                prop_assert_eq!(&actual, &model);

                if let Some(stored) = selection.store().get(SELECTION_KEY) {
                    let stored: BTreeSet<String> = serde_json::from_value(stored).unwrap();
                    prop_assert_eq!(stored, model);
                }
            }
        }
    }
}
