//! FILENAME: view-engine/src/selection.rs
//! Selection Model - selected record ids, kept across filter and sort changes.

use rustc_hash::FxHashSet;

use crate::record::RecordId;

/// Set of selected record ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionModel {
    selected: FxHashSet<RecordId>,
}

impl SelectionModel {
    pub fn new() -> Self {
        SelectionModel::default()
    }

    /// Flips the selection of `id`. Returns whether it is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.selected.remove(id) {
            false
        } else {
            self.selected.insert(id.to_string());
            true
        }
    }

    pub fn select(&mut self, id: &str) {
        self.selected.insert(id.to_string());
    }

    /// Replaces the selection with exactly `ids`.
    pub fn select_all<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = RecordId>,
    {
        self.selected = ids.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Drops ids for which `exists` is false. Returns how many were removed.
    pub fn retain_existing<F>(&mut self, exists: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let before = self.selected.len();
        self.selected.retain(|id| exists(id));
        before - self.selected.len()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected ids in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.selected.iter().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
