//! In-memory settings store.

use std::collections::HashMap;
use std::sync::Mutex;

use sidefold_core::error::Result;
use sidefold_core::settings::SettingsStore;
use tokio::sync::broadcast;

/// Volatile store for tests and embeddings without durable storage.
///
/// Change notifications carry the mutated key; subscribers that lag are
/// fine dropping notifications, since consumers re-read the store rather
/// than relying on event payloads.
pub struct MemorySettingsStore {
    entries: Mutex<HashMap<String, String>>,
    changed: broadcast::Sender<String>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        let (changed, _) = broadcast::channel(64);
        Self {
            entries: Mutex::new(HashMap::new()),
            changed,
        }
    }
}

impl Default for MemorySettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value.to_string());
        let _ = self.changed.send(key.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let removed = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key)
            .is_some();
        if removed {
            let _ = self.changed.send(key.to_string());
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<String> {
        self.changed.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_values() {
        let store = MemorySettingsStore::new();
        assert!(store.get("k").is_none());
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert!(store.get("k").is_none());
    }

    #[test]
    fn notifies_subscribers_with_mutated_key() {
        let store = MemorySettingsStore::new();
        let mut rx = store.subscribe();
        store.set("oa-sidebar-top", "120").unwrap();
        assert_eq!(rx.try_recv().unwrap(), "oa-sidebar-top");
    }

    #[test]
    fn removing_absent_key_does_not_notify() {
        let store = MemorySettingsStore::new();
        let mut rx = store.subscribe();
        store.remove("missing").unwrap();
        assert!(rx.try_recv().is_err());
    }
}
