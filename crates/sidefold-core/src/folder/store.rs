//! Folder tree store: structural operations over the classification
//! hierarchy, with synchronous whole-state persistence on every mutation.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::model::{FolderNode, FolderState};
use crate::error::Result;
use crate::settings::keys::FOLDER_STATE;
use crate::settings::SettingsStore;

/// Owns the folder forest, the assignment map, and the active filter.
///
/// All mutations update memory first, then persist the entire serialized
/// state to the settings store before returning, so no partial-write state
/// is ever exposed to readers. Concurrent mutation from another execution
/// context is reconciled only passively via [`FolderTreeStore::reload`]
/// (last-writer-wins, no merge).
pub struct FolderTreeStore {
    state: FolderState,
    active_filter: Option<String>,
    store: Arc<dyn SettingsStore>,
}

impl FolderTreeStore {
    /// Loads state from the settings store; a missing or corrupt blob
    /// yields an empty state.
    pub fn load(store: Arc<dyn SettingsStore>) -> Self {
        let state = FolderState::from_blob(store.get(FOLDER_STATE).as_deref());
        Self {
            state,
            active_filter: None,
            store,
        }
    }

    pub fn state(&self) -> &FolderState {
        &self.state
    }

    pub fn folders(&self) -> &[FolderNode] {
        &self.state.folders
    }

    /// Current assignment of a conversation, if any. Dangling targets are
    /// reported as-is; visibility logic treats them as unassigned.
    pub fn assignment_of(&self, conversation_id: &str) -> Option<&str> {
        self.state
            .assignments
            .get(conversation_id)
            .map(String::as_str)
    }

    pub fn active_filter(&self) -> Option<&str> {
        self.active_filter.as_deref()
    }

    /// Selects the active filter folder (`None` shows everything). Not
    /// persisted; filter selection is per-page-context.
    pub fn set_active_filter(&mut self, folder_id: Option<String>) {
        self.active_filter = folder_id;
    }

    /// Creates a folder as a leaf under `parent_id` (or as a root) and
    /// returns its generated id. Duplicate names at the same level are
    /// permitted.
    pub fn create_folder(&mut self, name: &str, parent_id: Option<&str>) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.state.folders.push(FolderNode {
            id: id.clone(),
            name: name.trim().to_string(),
            parent_id: parent_id.map(str::to_string),
        });
        self.persist()?;
        Ok(id)
    }

    /// Deletes a folder and every descendant, removing all assignments
    /// pointing into the removed set. If the active filter was inside the
    /// removed set it resets to none. Returns the removed folder ids.
    pub fn delete_folder(&mut self, folder_id: &str) -> Result<Vec<String>> {
        let closure = self.descendant_ids(folder_id);
        self.state.folders.retain(|f| !closure.contains(&f.id));
        self.state
            .assignments
            .retain(|_, assigned| !closure.contains(assigned));
        if self
            .active_filter
            .as_ref()
            .is_some_and(|active| closure.contains(active))
        {
            debug!(folder_id, "active filter removed by cascade, resetting");
            self.active_filter = None;
        }
        self.persist()?;
        Ok(closure.into_iter().collect())
    }

    /// Upserts or removes the folder assignment of a conversation.
    pub fn assign(&mut self, conversation_id: &str, folder_id: Option<&str>) -> Result<()> {
        match folder_id {
            Some(folder_id) => {
                self.state
                    .assignments
                    .insert(conversation_id.to_string(), folder_id.to_string());
            }
            None => {
                self.state.assignments.remove(conversation_id);
            }
        }
        self.persist()
    }

    /// Breadth-first descendant closure over `parent_id` edges, including
    /// the requested id itself (whether or not it still exists).
    pub fn descendant_ids(&self, folder_id: &str) -> HashSet<String> {
        let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
        for folder in &self.state.folders {
            if let Some(parent) = &folder.parent_id {
                children.entry(parent).or_default().push(&folder.id);
            }
        }

        let mut closure = HashSet::new();
        let mut queue = VecDeque::from([folder_id.to_string()]);
        while let Some(current) = queue.pop_front() {
            if let Some(kids) = children.get(current.as_str()) {
                queue.extend(kids.iter().map(|id| id.to_string()));
            }
            closure.insert(current);
        }
        closure
    }

    /// Display path of a folder: parent-link walk to the root, names
    /// joined with `" / "`. Unknown ids yield an empty string.
    pub fn path_of(&self, folder_id: &str) -> String {
        let lookup: HashMap<&str, &FolderNode> = self
            .state
            .folders
            .iter()
            .map(|f| (f.id.as_str(), f))
            .collect();
        let mut names = Vec::new();
        let mut current = lookup.get(folder_id).copied();
        while let Some(folder) = current {
            names.push(folder.name.as_str());
            current = folder
                .parent_id
                .as_deref()
                .and_then(|parent| lookup.get(parent).copied());
        }
        names.reverse();
        names.join(" / ")
    }

    /// Discards in-memory state and re-reads the persisted blob
    /// (cross-context change path; last-writer-wins). An active filter
    /// left dangling by the reload resets to none.
    pub fn reload(&mut self) {
        self.state = FolderState::from_blob(self.store.get(FOLDER_STATE).as_deref());
        if let Some(active) = &self.active_filter {
            if !self.state.folders.iter().any(|f| &f.id == active) {
                debug!(folder_id = %active, "active filter gone after reload, resetting");
                self.active_filter = None;
            }
        }
    }

    fn persist(&self) -> Result<()> {
        let blob = serde_json::to_string(&self.state)?;
        self.store.set(FOLDER_STATE, &blob)
    }
}
