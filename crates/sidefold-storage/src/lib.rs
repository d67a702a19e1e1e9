//! Settings store implementations.

mod json;
mod memory;

pub use json::JsonSettingsStore;
pub use memory::MemorySettingsStore;
