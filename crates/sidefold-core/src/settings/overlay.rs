//! Typed accessors over the raw key/value store.

use std::sync::Arc;

use super::keys;
use super::store::SettingsStore;
use crate::error::Result;

/// Typed view of the overlay's persisted chrome settings.
///
/// Defaults and fallbacks live here so callers never see raw strings:
/// unparsable numerics fall back to the default (or `None` for optional
/// dimensions) instead of erroring.
#[derive(Clone)]
pub struct OverlaySettings {
    store: Arc<dyn SettingsStore>,
}

impl OverlaySettings {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    pub fn is_collapsed(&self) -> bool {
        self.store
            .get(keys::SIDEBAR_COLLAPSED)
            .is_some_and(|v| v == "1")
    }

    pub fn set_collapsed(&self, collapsed: bool) -> Result<()> {
        self.store
            .set(keys::SIDEBAR_COLLAPSED, if collapsed { "1" } else { "0" })
    }

    pub fn top(&self) -> f64 {
        self.store
            .get(keys::SIDEBAR_TOP)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(keys::DEFAULT_TOP)
    }

    pub fn set_top(&self, top: f64) -> Result<()> {
        self.store.set(keys::SIDEBAR_TOP, &top.to_string())
    }

    pub fn color(&self) -> String {
        self.store
            .get(keys::SIDEBAR_COLOR)
            .unwrap_or_else(|| keys::DEFAULT_COLOR.to_string())
    }

    pub fn set_color(&self, color: &str) -> Result<()> {
        self.store.set(keys::SIDEBAR_COLOR, color)
    }

    pub fn width(&self) -> Option<f64> {
        self.dimension(keys::SIDEBAR_WIDTH)
    }

    pub fn set_width(&self, width: f64) -> Result<()> {
        self.store.set(keys::SIDEBAR_WIDTH, &width.to_string())
    }

    pub fn height(&self) -> Option<f64> {
        self.dimension(keys::SIDEBAR_HEIGHT)
    }

    pub fn set_height(&self, height: f64) -> Result<()> {
        self.store.set(keys::SIDEBAR_HEIGHT, &height.to_string())
    }

    pub fn is_folder_panel_collapsed(&self) -> bool {
        self.store
            .get(keys::FOLDER_PANEL_COLLAPSED)
            .is_some_and(|v| v == "1")
    }

    pub fn set_folder_panel_collapsed(&self, collapsed: bool) -> Result<()> {
        self.store
            .set(keys::FOLDER_PANEL_COLLAPSED, if collapsed { "1" } else { "0" })
    }

    fn dimension(&self, key: &str) -> Option<f64> {
        self.store
            .get(key)?
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }
}
