//! Settings store trait.
//!
//! Defines the interface for the persisted key/value blob store backing the
//! overlay (the embedding maps it onto whatever the platform provides).

use tokio::sync::broadcast;

use crate::error::Result;

/// An abstract string key/value store for persisted overlay state.
///
/// The contract is deliberately synchronous: every folder mutation persists
/// the whole state before returning, so readers never observe a
/// partial-write state. Values are plain strings; structured state is a
/// JSON blob under a single versioned key.
///
/// # Implementation Notes
///
/// Implementations should:
/// - Tolerate missing keys (`get` returns `None`)
/// - Broadcast changed keys to subscribers, including changes made by
///   another execution context sharing the same backing store
pub trait SettingsStore: Send + Sync {
    /// Reads a value. Missing keys are `None`, never an error.
    fn get(&self, key: &str) -> Option<String>;

    /// Writes a value and notifies subscribers of the changed key.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes a key if present and notifies subscribers.
    fn remove(&self, key: &str) -> Result<()>;

    /// Subscribes to changed-key notifications.
    fn subscribe(&self) -> broadcast::Receiver<String>;
}
