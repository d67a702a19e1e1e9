//! Engine layer: the resync loop over a live page tree and the folder
//! classification service.

mod engine;
mod folder_service;
mod scheduler;

pub use engine::OverlayEngine;
pub use folder_service::FolderService;
pub use scheduler::{ResyncScheduler, DEFAULT_SETTLE};
