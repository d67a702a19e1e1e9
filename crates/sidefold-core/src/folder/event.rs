use serde::{Deserialize, Serialize};

/// Notifications published after a folder mutation has been persisted.
///
/// Consumers (panel renderers, filter projections) react to these instead
/// of polling the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FolderEvent {
    /// A folder was created (always as a leaf).
    FolderCreated {
        folder_id: String,
        name: String,
        #[serde(default)]
        parent_id: Option<String>,
    },
    /// A conversation's folder assignment changed; `folder_id` of `None`
    /// means the assignment was cleared.
    AssignmentChanged {
        conversation_id: String,
        #[serde(default)]
        folder_id: Option<String>,
    },
    /// A folder and its whole subtree were deleted. `removed` lists every
    /// folder id that disappeared, including `folder_id` itself.
    FolderDeleted {
        folder_id: String,
        removed: Vec<String>,
    },
    /// The active filter selection changed (not persisted).
    FilterChanged {
        #[serde(default)]
        folder_id: Option<String>,
    },
    /// The persisted state was rewritten by another execution context and
    /// has been re-read wholesale.
    StateReloaded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_snake_case_tag() {
        let event = FolderEvent::AssignmentChanged {
            conversation_id: "c-1".into(),
            folder_id: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"assignment_changed\""));
    }

    #[test]
    fn deserializes_without_optional_fields() {
        let event: FolderEvent =
            serde_json::from_str(r#"{"type":"filter_changed"}"#).unwrap();
        assert!(matches!(event, FolderEvent::FilterChanged { folder_id: None }));
    }
}
