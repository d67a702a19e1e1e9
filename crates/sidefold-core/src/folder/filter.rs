//! Visibility projection over externally enumerated conversation records.

use std::collections::{BTreeMap, HashSet};

use super::store::FolderTreeStore;

/// Immutable snapshot of the filter decision, derived from the store.
///
/// Rebuilt whenever folders, assignments, or the active filter change;
/// the record set itself is enumerated by the caller, so the projection
/// only answers per-id visibility.
#[derive(Debug, Clone)]
pub struct FilterProjection {
    /// Allowed folder closure; `None` means no active filter.
    allowed: Option<HashSet<String>>,
    assignments: BTreeMap<String, String>,
}

impl FilterProjection {
    /// Captures the current filter decision from the store.
    pub fn of(store: &FolderTreeStore) -> Self {
        let allowed = store
            .active_filter()
            .map(|active| store.descendant_ids(active));
        Self {
            allowed,
            assignments: store.state().assignments.clone(),
        }
    }

    /// Whether a filter is active at all.
    pub fn is_filtered(&self) -> bool {
        self.allowed.is_some()
    }

    /// Visibility of one conversation record.
    ///
    /// Under no filter everything is visible. Under an active filter a
    /// record is visible only when its assignment lands inside the active
    /// folder's descendant closure; unassigned records and dangling
    /// assignments are hidden.
    pub fn visible(&self, conversation_id: &str) -> bool {
        let Some(allowed) = &self.allowed else {
            return true;
        };
        self.assignments
            .get(conversation_id)
            .is_some_and(|assigned| allowed.contains(assigned))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use tokio::sync::broadcast;

    use super::*;
    use crate::error::Result;
    use crate::settings::SettingsStore;

    struct NullStore {
        entries: Mutex<HashMap<String, String>>,
        tx: broadcast::Sender<String>,
    }

    impl NullStore {
        fn new() -> Arc<Self> {
            let (tx, _) = broadcast::channel(16);
            Arc::new(Self {
                entries: Mutex::new(HashMap::new()),
                tx,
            })
        }
    }

    impl SettingsStore for NullStore {
        fn get(&self, key: &str) -> Option<String> {
            self.entries.lock().unwrap().get(key).cloned()
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }

        fn subscribe(&self) -> broadcast::Receiver<String> {
            self.tx.subscribe()
        }
    }

    #[test]
    fn no_filter_shows_everything() {
        let mut store = FolderTreeStore::load(NullStore::new());
        let a = store.create_folder("A", None).unwrap();
        store.assign("conv-x", Some(&a)).unwrap();

        let projection = FilterProjection::of(&store);
        assert!(!projection.is_filtered());
        assert!(projection.visible("conv-x"));
        assert!(projection.visible("conv-unassigned"));
    }

    #[test]
    fn parent_filter_includes_descendant_assignments() {
        let mut store = FolderTreeStore::load(NullStore::new());
        let a = store.create_folder("A", None).unwrap();
        let b = store.create_folder("B", Some(&a)).unwrap();
        let c = store.create_folder("C", Some(&a)).unwrap();
        store.assign("conv-a", Some(&a)).unwrap();
        store.assign("conv-b", Some(&b)).unwrap();
        store.assign("conv-c", Some(&c)).unwrap();
        store.assign("conv-other", Some("elsewhere")).unwrap();

        store.set_active_filter(Some(a));
        let projection = FilterProjection::of(&store);
        assert!(projection.visible("conv-a"));
        assert!(projection.visible("conv-b"));
        assert!(projection.visible("conv-c"));
        assert!(!projection.visible("conv-other"));
        assert!(!projection.visible("conv-unassigned"));
    }

    #[test]
    fn dangling_assignment_hidden_under_filter_visible_without() {
        let mut store = FolderTreeStore::load(NullStore::new());
        let a = store.create_folder("A", None).unwrap();
        store.assign("conv-x", Some("gone")).unwrap();

        assert!(FilterProjection::of(&store).visible("conv-x"));
        store.set_active_filter(Some(a));
        assert!(!FilterProjection::of(&store).visible("conv-x"));
    }

    #[test]
    fn leaf_filter_excludes_parent_assignments() {
        let mut store = FolderTreeStore::load(NullStore::new());
        let a = store.create_folder("A", None).unwrap();
        let b = store.create_folder("B", Some(&a)).unwrap();
        store.assign("conv-a", Some(&a)).unwrap();
        store.assign("conv-b", Some(&b)).unwrap();

        store.set_active_filter(Some(b));
        let projection = FilterProjection::of(&store);
        assert!(!projection.visible("conv-a"));
        assert!(projection.visible("conv-b"));
    }
}
