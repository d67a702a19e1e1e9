//! Persisted key layout.
//!
//! All keys are string-valued. Flags use `"1"`/`"0"`; dimensions are
//! numeric strings; the folder state is one JSON blob under a versioned
//! key.

/// Sidebar collapse flag (`"1"`/`"0"`).
pub const SIDEBAR_COLLAPSED: &str = "oa-sidebar-collapsed";

/// Vertical offset of the sidebar, numeric string.
pub const SIDEBAR_TOP: &str = "oa-sidebar-top";

/// Accent color, hex string.
pub const SIDEBAR_COLOR: &str = "oa-sidebar-color";

/// Sidebar width override, numeric string.
pub const SIDEBAR_WIDTH: &str = "oa-sidebar-width";

/// Sidebar height override, numeric string.
pub const SIDEBAR_HEIGHT: &str = "oa-sidebar-height";

/// Folder panel collapse flag (`"1"`/`"0"`).
pub const FOLDER_PANEL_COLLAPSED: &str = "oa-folder-collapsed";

/// Versioned JSON blob holding `{folders, assignments}`.
pub const FOLDER_STATE: &str = "oa-folder-state-v1";

/// Default vertical offset when unset or unparsable.
pub const DEFAULT_TOP: f64 = 80.0;

/// Default accent color.
pub const DEFAULT_COLOR: &str = "#0a0f1a";
