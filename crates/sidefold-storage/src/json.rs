//! File-backed settings store.
//!
//! All settings live in a single JSON object file. The map is cached in
//! memory; every mutation rewrites the whole file before returning, so a
//! reader never observes a partially applied change.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sidefold_core::error::{Result, SidefoldError};
use sidefold_core::settings::SettingsStore;
use tokio::sync::broadcast;
use tracing::warn;

const SETTINGS_FILE: &str = "settings.json";

pub struct JsonSettingsStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
    changed: broadcast::Sender<String>,
}

impl JsonSettingsStore {
    /// Opens (or starts) the store at the default platform data path,
    /// `<data_dir>/sidefold/settings.json`.
    pub fn open_default() -> Result<Self> {
        let base = dirs::data_dir()
            .ok_or_else(|| SidefoldError::storage("no platform data directory available"))?;
        Self::open(base.join("sidefold").join(SETTINGS_FILE))
    }

    /// Opens the store at an explicit path. A missing file starts empty;
    /// a corrupt file is treated the same after a warning, and the next
    /// write replaces it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let entries = Self::read_entries(&path);
        let (changed, _) = broadcast::channel(64);
        Ok(Self {
            path,
            entries: Mutex::new(entries),
            changed,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(path: &Path) -> BTreeMap<String, String> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return BTreeMap::new(),
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "corrupt settings file, starting empty");
                BTreeMap::new()
            }
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let blob = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, blob)?;
        Ok(())
    }
}

impl SettingsStore for JsonSettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)?;
        let _ = self.changed.send(key.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_entries(&entries)?;
        let _ = self.changed.send(key.to_string());
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
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);

        let store = JsonSettingsStore::open(&path).unwrap();
        store.set("oa-sidebar-color", "#112233").unwrap();
        store.set("oa-sidebar-top", "120").unwrap();
        drop(store);

        let reopened = JsonSettingsStore::open(&path).unwrap();
        assert_eq!(reopened.get("oa-sidebar-color").as_deref(), Some("#112233"));
        assert_eq!(reopened.get("oa-sidebar-top").as_deref(), Some("120"));
    }

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSettingsStore::open(dir.path().join("nested/settings.json")).unwrap();
        assert!(store.get("anything").is_none());
    }

    #[test]
    fn corrupt_file_starts_empty_and_recovers_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "{broken").unwrap();

        let store = JsonSettingsStore::open(&path).unwrap();
        assert!(store.get("k").is_none());
        store.set("k", "v").unwrap();

        let reopened = JsonSettingsStore::open(&path).unwrap();
        assert_eq!(reopened.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn remove_persists_and_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        let store = JsonSettingsStore::open(&path).unwrap();
        store.set("k", "v").unwrap();

        let mut rx = store.subscribe();
        store.remove("k").unwrap();
        assert_eq!(rx.try_recv().unwrap(), "k");

        let reopened = JsonSettingsStore::open(&path).unwrap();
        assert!(reopened.get("k").is_none());
    }
}
