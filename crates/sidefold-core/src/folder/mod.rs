//! Folder classification: hierarchy model, persistent store, filter
//! projection, and change events.

mod event;
mod filter;
mod model;
mod store;

pub use event::FolderEvent;
pub use filter::FilterProjection;
pub use model::{FolderNode, FolderState};
pub use store::FolderTreeStore;
