//! Gemini page resolver.
//!
//! Gemini's document churns across releases, so resolution is tiered.
//! The preferred shape is grouped: `.turn` containers inside the
//! `ucs-conversation` embedded fragment, each holding a question block
//! and a `ucs-summary` response, with native indices on the markup.
//! When no grouped turn exists, ordered role-matcher tiers (custom tags,
//! test ids, role attributes, legacy classes) pair prompts and responses
//! by document order instead. Ungrouped queries pierce embedded
//! fragments; the host renders message content inside them.

use sidefold_core::page::{NodeId, NodeMatcher, PageTree};
use sidefold_core::turn::{resolve_role_tiers, ResolvedTurn, RoleTier, TurnResolver};
use tracing::trace;

const QUERY_INDEX_ATTR: &str = "data-query-index";
const TURN_INDEX_ATTR: &str = "data-turn-index";

pub struct GeminiResolver;

fn question_matcher() -> NodeMatcher {
    NodeMatcher::any_of([
        NodeMatcher::class("question-wrapper"),
        NodeMatcher::class("question-block"),
    ])
}

fn ungrouped_tiers() -> Vec<RoleTier> {
    vec![
        RoleTier::new(
            "tag",
            NodeMatcher::tag("user-query"),
            NodeMatcher::tag("model-response"),
        ),
        RoleTier::new(
            "test-id",
            NodeMatcher::any_of([
                NodeMatcher::attr_equals("data-test-id", "user-message"),
                NodeMatcher::attr_equals("data-test-id", "user-query"),
            ]),
            NodeMatcher::attr_equals("data-test-id", "model-response"),
        ),
        RoleTier::new(
            "test-id-substr",
            NodeMatcher::any_of([
                NodeMatcher::attr_contains("data-test-id", "user"),
                NodeMatcher::tag("user-query"),
            ]),
            NodeMatcher::any_of([
                NodeMatcher::attr_contains("data-test-id", "model"),
                NodeMatcher::tag("model-response"),
            ]),
        ),
        RoleTier::new(
            "role-attr",
            NodeMatcher::any_of([
                NodeMatcher::attr_equals("data-message-author-role", "user"),
                NodeMatcher::attr_equals("data-turn", "user"),
            ]),
            NodeMatcher::any_of([
                NodeMatcher::attr_equals("data-message-author-role", "assistant"),
                NodeMatcher::attr_equals("data-turn", "assistant"),
            ]),
        ),
        RoleTier::new(
            "legacy-class",
            question_matcher(),
            NodeMatcher::tag("ucs-summary"),
        ),
    ]
}

impl GeminiResolver {
    /// Grouped `.turn` containers: those inside any `ucs-conversation`
    /// fragment first, then any rendered directly in the page, without
    /// duplicates.
    fn turn_containers(&self, page: &PageTree) -> Vec<NodeId> {
        let turn = NodeMatcher::class("turn");
        let mut containers = Vec::new();

        let conversation = NodeMatcher::tag("ucs-conversation");
        for host in page.query_all(page.root(), &conversation, false) {
            let Some(fragment) = page.fragment(host) else {
                continue;
            };
            let scope = page
                .query_first(fragment, &NodeMatcher::class("main"), false)
                .unwrap_or(fragment);
            for node in page.query_all(scope, &turn, false) {
                if !containers.contains(&node) {
                    containers.push(node);
                }
            }
        }
        for node in page.query_all(page.root(), &turn, false) {
            if !containers.contains(&node) {
                containers.push(node);
            }
        }
        containers
    }

    fn native_id(&self, page: &PageTree, turn: NodeId, question: NodeId) -> Option<String> {
        let query_index = page
            .attribute(question, QUERY_INDEX_ATTR)
            .or_else(|| page.attribute(turn, QUERY_INDEX_ATTR));
        if let Some(index) = query_index {
            return Some(format!("gemini-q-{index}"));
        }

        let markdown = page.query_first(question, &NodeMatcher::tag("ucs-fast-markdown"), false);
        let turn_index = markdown
            .and_then(|node| page.attribute(node, TURN_INDEX_ATTR))
            .or_else(|| page.attribute(turn, TURN_INDEX_ATTR));
        turn_index.map(|index| format!("gemini-t-{index}"))
    }

    fn resolve_grouped(&self, page: &PageTree) -> Vec<ResolvedTurn> {
        let question = question_matcher();
        let response = NodeMatcher::tag("ucs-summary");
        self.turn_containers(page)
            .into_iter()
            .filter_map(|turn| {
                let prompt = page.query_first(turn, &question, false)?;
                let summary = page.query_first(turn, &response, false)?;
                Some(ResolvedTurn {
                    native_id: self.native_id(page, turn, prompt),
                    prompt,
                    response: summary,
                    strategy: "grouped",
                })
            })
            .collect()
    }
}

impl TurnResolver for GeminiResolver {
    fn provider(&self) -> &'static str {
        "gemini"
    }

    fn origin_matches(&self, origin: &str) -> bool {
        origin.contains("gemini.google")
    }

    fn resolve_turns(&self, page: &PageTree) -> Vec<ResolvedTurn> {
        let grouped = self.resolve_grouped(page);
        if !grouped.is_empty() {
            return grouped;
        }
        trace!("no grouped turns, falling back to role tiers");
        resolve_role_tiers(page, &ungrouped_tiers(), true)
    }

    /// Clips the rendered markdown inside the response rather than the
    /// response shell, so the injected fold control on the shell stays
    /// clickable while folded.
    fn fold_target(&self, page: &PageTree, response: NodeId) -> NodeId {
        let markdown = NodeMatcher::class("markdown-document");
        if let Some(fragment) = page.fragment(response) {
            if let Some(doc) = page.query_first(fragment, &markdown, true) {
                return doc;
            }
        }
        page.query_first(response, &markdown, true).unwrap_or(response)
    }

    /// Prompt text lives inside a `ucs-fast-markdown` fragment when the
    /// renderer has hydrated; older layouts expose a `.query-text` node
    /// instead. Falls back to the prompt region itself.
    fn summary_source(&self, page: &PageTree, prompt: NodeId) -> NodeId {
        let fast_markdown = NodeMatcher::tag("ucs-fast-markdown");
        if let Some(host) = page.query_first(prompt, &fast_markdown, true) {
            if let Some(fragment) = page.fragment(host) {
                let markdown = NodeMatcher::class("markdown-document");
                if let Some(doc) = page.query_first(fragment, &markdown, true) {
                    if !page.text_content(doc).trim().is_empty() {
                        return doc;
                    }
                }
            }
        }
        if let Some(query_text) =
            page.query_first(prompt, &NodeMatcher::class("query-text"), true)
        {
            if !page.text_content(query_text).trim().is_empty() {
                return query_text;
            }
        }
        prompt
    }
}
