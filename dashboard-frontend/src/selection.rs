//! Row selection for bulk actions.

use std::collections::BTreeSet;

/// Selected row ids. Always a subset of the ids currently loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    selected: BTreeSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `id`. Ids that are not loaded are ignored.
    pub fn toggle(&mut self, id: &str, loaded: &[String]) {
        if self.selected.remove(id) {
            return;
        }
        if loaded.iter().any(|loaded_id| loaded_id == id) {
            self.selected.insert(id.to_string());
        }
    }

    /// Select every loaded row, or clear if they are all selected already.
    pub fn select_all(&mut self, loaded: &[String]) {
        if self.is_all_selected(loaded) {
            self.selected.clear();
        } else {
            self.selected = loaded.iter().cloned().collect();
        }
    }

    pub fn is_all_selected(&self, loaded: &[String]) -> bool {
        !loaded.is_empty()
            && self.selected.len() == loaded.len()
            && loaded.iter().all(|id| self.selected.contains(id))
    }

    /// Drop ids that are no longer loaded.
    pub fn sync(&mut self, loaded: &[String]) {
        self.selected.retain(|id| loaded.contains(id));
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }
}
