//! Folder classification data model.
//!
//! Serialized field names stay camelCase so the persisted blob remains
//! readable by earlier builds of the overlay that wrote the same key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A named node in the user-defined classification hierarchy.
///
/// Nodes form a forest: no `parent_id` means root. Cycles are impossible
/// by construction — nodes are only ever created as leaves with a parent
/// chosen from existing nodes (or none).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderNode {
    /// Opaque generated identifier.
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// The durable folder state: the folder forest plus the assignment map
/// from external conversation ids to folder ids.
///
/// A value in `assignments` should reference a folder, but dangling
/// references (an external deletion race) are tolerated as "unassigned",
/// never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FolderState {
    #[serde(default)]
    pub folders: Vec<FolderNode>,
    #[serde(default)]
    pub assignments: BTreeMap<String, String>,
}

impl FolderState {
    /// Parses the persisted blob. A missing blob or one that fails to
    /// parse yields an empty state — the feature is non-critical, so
    /// corruption resets rather than propagates.
    pub fn from_blob(blob: Option<&str>) -> Self {
        let Some(raw) = blob else {
            return Self::default();
        };
        match serde_json::from_str(raw) {
            Ok(state) => state,
            Err(err) => {
                warn!(error = %err, "corrupt folder state blob, resetting to empty");
                Self::default()
            }
        }
    }
}
