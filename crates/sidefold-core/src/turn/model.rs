//! Turn list data model.

use std::collections::HashMap;

use crate::page::NodeId;

/// Role anchoring a turn record. The record is keyed on the user prompt;
/// the paired response region rides along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
}

/// One matched prompt/response pair in the conversation.
///
/// Records are ephemeral: rebuilt from scratch on every resync pass,
/// never mutated in place, and discarded wholesale between passes. Only
/// the `id` → folded mapping survives a pass, via [`FoldState`].
#[derive(Debug, Clone, PartialEq)]
pub struct TurnRecord {
    /// Best-effort stable identity (see the normalizer for derivation).
    pub id: String,
    pub role: TurnRole,
    /// First non-empty line of the prompt, truncated to 80 characters.
    pub summary: String,
    /// Non-owning reference to the prompt region in the host tree.
    pub prompt: NodeId,
    /// Non-owning reference to the response region in the host tree.
    pub response: NodeId,
    pub folded: bool,
}

/// Process-lifetime fold intent, independent of the rebuilt-per-pass turn
/// records. Ids that disappear from the tree keep their entry; if the same
/// id resurfaces the intent re-applies.
#[derive(Debug, Clone, Default)]
pub struct FoldState {
    folded: HashMap<String, bool>,
}

impl FoldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold intent for an id; ids never seen before default to expanded.
    pub fn is_folded(&self, id: &str) -> bool {
        self.folded.get(id).copied().unwrap_or(false)
    }

    pub fn set(&mut self, id: impl Into<String>, folded: bool) {
        self.folded.insert(id.into(), folded);
    }

    /// Whether any intent was ever recorded for this id.
    pub fn is_known(&self, id: &str) -> bool {
        self.folded.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_state_defaults_to_expanded() {
        let mut state = FoldState::new();
        assert!(!state.is_folded("chatgpt-role-attr-0"));
        assert!(!state.is_known("chatgpt-role-attr-0"));
        state.set("chatgpt-role-attr-0", true);
        assert!(state.is_folded("chatgpt-role-attr-0"));
        state.set("chatgpt-role-attr-0", false);
        assert!(!state.is_folded("chatgpt-role-attr-0"));
        assert!(state.is_known("chatgpt-role-attr-0"));
    }
}
