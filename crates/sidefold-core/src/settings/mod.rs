//! Persisted settings: key layout, store trait, typed accessors.

pub mod keys;
mod overlay;
mod store;

pub use overlay::OverlaySettings;
pub use store::SettingsStore;
