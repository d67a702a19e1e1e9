//! Provider resolver contract.
//!
//! Each supported chat provider structures its document differently
//! (attribute role markers, tag-name turn containers, class heuristics),
//! so turn resolution is polymorphic over a small closed set of provider
//! implementations selected once at startup by origin match.

use crate::page::{NodeId, NodeMatcher, PageTree};

/// A provider-canonical prompt/response pair, before identity assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTurn {
    pub prompt: NodeId,
    pub response: NodeId,
    /// Provider-native stable identifier, already prefixed (for example
    /// `gemini-q-3`). Absent when the provider exposes none.
    pub native_id: Option<String>,
    /// Name of the resolution strategy that produced this pair. Scopes
    /// positional fallback ids so a strategy switch cannot alias turns.
    pub strategy: &'static str,
}

/// One fallback tier of role-based resolution: a matcher per role, paired
/// by document order.
#[derive(Debug, Clone)]
pub struct RoleTier {
    pub strategy: &'static str,
    pub prompt: NodeMatcher,
    pub response: NodeMatcher,
}

impl RoleTier {
    pub fn new(strategy: &'static str, prompt: NodeMatcher, response: NodeMatcher) -> Self {
        Self {
            strategy,
            prompt,
            response,
        }
    }
}

/// Translates one provider's structural conventions into the canonical
/// turn pair list.
pub trait TurnResolver: Send + Sync {
    /// Short provider name; prefixes derived turn ids.
    fn provider(&self) -> &'static str;

    /// Whether this resolver handles the given host origin.
    fn origin_matches(&self, origin: &str) -> bool;

    /// Resolves the current turn pairs from the page. A pass matching
    /// nothing returns an empty list; the next resync retries naturally.
    fn resolve_turns(&self, page: &PageTree) -> Vec<ResolvedTurn>;

    /// The sub-node to clip when folding a response. Defaults to the
    /// response region itself; providers hosting response content inside
    /// an embedded fragment resolve into it so the clip cannot swallow
    /// the fold control on the outer shell.
    fn fold_target(&self, page: &PageTree, response: NodeId) -> NodeId {
        let _ = page;
        response
    }

    /// The node whose text feeds the turn summary. Defaults to the prompt
    /// region itself.
    fn summary_source(&self, page: &PageTree, prompt: NodeId) -> NodeId {
        let _ = page;
        prompt
    }
}

/// Runs ordered fallback tiers of role-based resolution; the first tier
/// yielding at least one pair wins. Pairing is by document-order index,
/// which is only correct when no grouping container exists — grouped
/// providers resolve containers themselves before falling back to this.
pub fn resolve_role_tiers(page: &PageTree, tiers: &[RoleTier], pierce: bool) -> Vec<ResolvedTurn> {
    for tier in tiers {
        let prompts = page.query_all(page.root(), &tier.prompt, pierce);
        let responses = page.query_all(page.root(), &tier.response, pierce);
        let len = prompts.len().min(responses.len());
        if len == 0 {
            continue;
        }
        return prompts
            .into_iter()
            .zip(responses)
            .take(len)
            .map(|(prompt, response)| ResolvedTurn {
                prompt,
                response,
                native_id: None,
                strategy: tier.strategy,
            })
            .collect();
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role_node(page: &mut PageTree, role: &str) -> NodeId {
        let node = page.create_element("div");
        page.set_attribute(node, "data-role", role);
        let root = page.root();
        page.append_child(root, node);
        node
    }

    fn tiers() -> Vec<RoleTier> {
        vec![
            RoleTier::new(
                "attr",
                NodeMatcher::attr_equals("data-role", "user"),
                NodeMatcher::attr_equals("data-role", "assistant"),
            ),
            RoleTier::new(
                "attr-substr",
                NodeMatcher::attr_contains("data-role", "usr"),
                NodeMatcher::attr_contains("data-role", "asst"),
            ),
        ]
    }

    #[test]
    fn first_matching_tier_wins() {
        let mut page = PageTree::new();
        let user = role_node(&mut page, "user");
        let assistant = role_node(&mut page, "assistant");

        let turns = resolve_role_tiers(&page, &tiers(), false);
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].prompt, user);
        assert_eq!(turns[0].response, assistant);
        assert_eq!(turns[0].strategy, "attr");
    }

    #[test]
    fn falls_through_to_later_tiers() {
        let mut page = PageTree::new();
        role_node(&mut page, "usr-msg");
        role_node(&mut page, "asst-msg");

        let turns = resolve_role_tiers(&page, &tiers(), false);
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].strategy, "attr-substr");
    }

    #[test]
    fn no_tier_matching_yields_empty() {
        let mut page = PageTree::new();
        role_node(&mut page, "other");
        assert!(resolve_role_tiers(&page, &tiers(), false).is_empty());
    }

    #[test]
    fn unbalanced_roles_pair_to_shorter_side() {
        let mut page = PageTree::new();
        role_node(&mut page, "user");
        role_node(&mut page, "assistant");
        role_node(&mut page, "user");

        let turns = resolve_role_tiers(&page, &tiers(), false);
        assert_eq!(turns.len(), 1);
    }
}
