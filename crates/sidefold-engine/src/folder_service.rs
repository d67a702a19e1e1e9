//! Folder service: classification operations plus the visibility
//! projection, with change events for panel consumers.

use std::sync::{Arc, Mutex, MutexGuard};

use sidefold_core::error::Result;
use sidefold_core::folder::{FilterProjection, FolderEvent, FolderNode, FolderTreeStore};
use sidefold_core::settings::{keys, SettingsStore};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

/// Wraps the [`FolderTreeStore`] with event publication and cross-context
/// reload.
///
/// Every mutation persists synchronously through the store before its
/// event goes out, so a subscriber that re-reads on an event always sees
/// the post-mutation state.
pub struct FolderService {
    store: Arc<Mutex<FolderTreeStore>>,
    settings: Arc<dyn SettingsStore>,
    events: broadcast::Sender<FolderEvent>,
    reload_handle: Mutex<Option<JoinHandle<()>>>,
}

impl FolderService {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            store: Arc::new(Mutex::new(FolderTreeStore::load(settings.clone()))),
            settings,
            events,
            reload_handle: Mutex::new(None),
        }
    }

    fn store(&self) -> MutexGuard<'_, FolderTreeStore> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, event: FolderEvent) {
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FolderEvent> {
        self.events.subscribe()
    }

    pub fn folders(&self) -> Vec<FolderNode> {
        self.store().folders().to_vec()
    }

    pub fn path_of(&self, folder_id: &str) -> String {
        self.store().path_of(folder_id)
    }

    pub fn assignment_of(&self, conversation_id: &str) -> Option<String> {
        self.store().assignment_of(conversation_id).map(str::to_string)
    }

    /// Current visibility projection snapshot.
    pub fn projection(&self) -> FilterProjection {
        FilterProjection::of(&self.store())
    }

    pub fn create_folder(&self, name: &str, parent_id: Option<&str>) -> Result<String> {
        let folder_id = self.store().create_folder(name, parent_id)?;
        self.publish(FolderEvent::FolderCreated {
            folder_id: folder_id.clone(),
            name: name.trim().to_string(),
            parent_id: parent_id.map(str::to_string),
        });
        Ok(folder_id)
    }

    /// Creates a folder and immediately files a conversation into it, the
    /// panel's one-step "new folder from here" flow.
    pub fn create_folder_for(
        &self,
        name: &str,
        parent_id: Option<&str>,
        conversation_id: &str,
    ) -> Result<String> {
        let folder_id = self.create_folder(name, parent_id)?;
        self.assign(conversation_id, Some(&folder_id))?;
        Ok(folder_id)
    }

    pub fn delete_folder(&self, folder_id: &str) -> Result<Vec<String>> {
        let removed = self.store().delete_folder(folder_id)?;
        self.publish(FolderEvent::FolderDeleted {
            folder_id: folder_id.to_string(),
            removed: removed.clone(),
        });
        Ok(removed)
    }

    pub fn assign(&self, conversation_id: &str, folder_id: Option<&str>) -> Result<()> {
        self.store().assign(conversation_id, folder_id)?;
        self.publish(FolderEvent::AssignmentChanged {
            conversation_id: conversation_id.to_string(),
            folder_id: folder_id.map(str::to_string),
        });
        Ok(())
    }

    pub fn active_filter(&self) -> Option<String> {
        self.store().active_filter().map(str::to_string)
    }

    pub fn set_filter(&self, folder_id: Option<String>) {
        self.store().set_active_filter(folder_id.clone());
        self.publish(FolderEvent::FilterChanged { folder_id });
    }

    /// Starts listening for folder-state writes from other execution
    /// contexts. A write whose content matches the in-memory state (this
    /// context's own persist) is ignored; anything else reloads wholesale,
    /// last writer wins. Idempotent.
    pub fn watch_external_changes(&self) {
        let mut handle = self
            .reload_handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if handle.is_some() {
            return;
        }
        let store = self.store.clone();
        let settings = self.settings.clone();
        let events = self.events.clone();
        let mut changes = self.settings.subscribe();
        *handle = Some(tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(key) if key == keys::FOLDER_STATE => {
                        let mut store =
                            store.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                        let current = serde_json::to_string(store.state()).ok();
                        if settings.get(keys::FOLDER_STATE) == current {
                            continue;
                        }
                        debug!("folder state changed externally, reloading");
                        store.reload();
                        drop(store);
                        let _ = events.send(FolderEvent::StateReloaded);
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }
}

impl Drop for FolderService {
    fn drop(&mut self) {
        if let Ok(mut handle) = self.reload_handle.lock() {
            if let Some(handle) = handle.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use sidefold_storage::MemorySettingsStore;

    use super::*;

    fn service() -> FolderService {
        FolderService::new(Arc::new(MemorySettingsStore::new()))
    }

    #[test]
    fn create_and_assign_publishes_events() {
        let service = service();
        let mut events = service.subscribe();

        let work = service.create_folder("Work", None).unwrap();
        service.assign("conv-1", Some(&work)).unwrap();

        assert!(matches!(
            events.try_recv().unwrap(),
            FolderEvent::FolderCreated { name, .. } if name == "Work"
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            FolderEvent::AssignmentChanged { conversation_id, .. } if conversation_id == "conv-1"
        ));
    }

    #[test]
    fn create_folder_for_files_the_conversation() {
        let service = service();
        let folder = service.create_folder_for("Rust", None, "conv-9").unwrap();
        assert_eq!(service.assignment_of("conv-9"), Some(folder.clone()));
        assert_eq!(service.path_of(&folder), "Rust");
    }

    #[test]
    fn delete_cascade_updates_projection() {
        let service = service();
        let a = service.create_folder("A", None).unwrap();
        let b = service.create_folder("B", Some(&a)).unwrap();
        service.assign("conv-b", Some(&b)).unwrap();
        service.set_filter(Some(a.clone()));
        assert!(service.projection().visible("conv-b"));

        let removed = service.delete_folder(&a).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(service.active_filter().is_none());
        assert!(service.projection().visible("conv-b"), "no filter, visible again");
        assert!(service.assignment_of("conv-b").is_none());
    }

    #[test]
    fn filter_changes_are_published() {
        let service = service();
        let a = service.create_folder("A", None).unwrap();
        let mut events = service.subscribe();
        service.set_filter(Some(a.clone()));
        assert!(matches!(
            events.try_recv().unwrap(),
            FolderEvent::FilterChanged { folder_id: Some(id) } if id == a
        ));
    }

    #[tokio::test]
    async fn external_write_reloads_state() {
        let settings = Arc::new(MemorySettingsStore::new());
        let service = FolderService::new(settings.clone());
        service.watch_external_changes();
        let mut events = service.subscribe();

        // Another context rewrites the blob wholesale.
        settings
            .set(
                keys::FOLDER_STATE,
                r#"{"folders":[{"id":"ext","name":"External"}],"assignments":{}}"#,
            )
            .unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(2), async {
            loop {
                if let Ok(FolderEvent::StateReloaded) = events.recv().await {
                    break;
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(service.folders()[0].name, "External");
    }

    #[tokio::test]
    async fn own_writes_do_not_trigger_reload_events() {
        let service = service();
        service.watch_external_changes();
        let mut events = service.subscribe();

        service.create_folder("Mine", None).unwrap();
        tokio::task::yield_now().await;

        // Only the creation event, never a reload.
        assert!(matches!(
            events.try_recv().unwrap(),
            FolderEvent::FolderCreated { .. }
        ));
        assert!(events.try_recv().is_err());
    }
}
