//! Batch-delete selection.

use std::collections::HashSet;

use uuid::Uuid;

use crate::store::InventoryStore;

/// Ids marked for batch deletion while select mode is on.
///
/// Cleared on cancel, after a delete, and whenever select mode is left.
#[derive(Debug, Default)]
pub struct Selection {
    active: bool,
    ids: HashSet<Uuid>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Flip select mode. Leaving it clears the selection.
    pub fn toggle_mode(&mut self) -> bool {
        self.active = !self.active;
        if !self.active {
            self.ids.clear();
        }
        self.active
    }

    /// Toggle one id. Ignored outside select mode. Returns whether the id is
    /// now selected.
    pub fn toggle(&mut self, id: Uuid) -> bool {
        if !self.active {
            return false;
        }
        if !self.ids.remove(&id) {
            self.ids.insert(id);
            return true;
        }
        false
    }

    pub fn is_selected(&self, id: Uuid) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &HashSet<Uuid> {
        &self.ids
    }

    /// Leave select mode without deleting anything.
    pub fn cancel(&mut self) {
        self.active = false;
        self.ids.clear();
    }

    /// Remove the selected items from `store` and leave select mode.
    pub async fn delete_selected(&mut self, store: &InventoryStore) -> usize {
        if self.ids.is_empty() {
            return 0;
        }
        let removed = store.remove_items(&self.ids).await;
        self.cancel();
        removed
    }
}
