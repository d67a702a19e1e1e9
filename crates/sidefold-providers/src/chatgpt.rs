//! ChatGPT page resolver.
//!
//! The ChatGPT document marks message content with a
//! `data-message-author-role` attribute inside per-message `article`
//! shells. Content nodes carry a `data-message-id` when the page has
//! hydrated; those become the stable turn ids, with document-order
//! pairing as the fallback identity.

use sidefold_core::page::{NodeId, NodeMatcher, PageTree};
use sidefold_core::turn::{resolve_role_tiers, ResolvedTurn, RoleTier, TurnResolver};

const ROLE_ATTR: &str = "data-message-author-role";
const MESSAGE_ID_ATTR: &str = "data-message-id";

pub struct ChatGptResolver;

fn fallback_tiers() -> Vec<RoleTier> {
    vec![
        RoleTier::new(
            "role-attr",
            NodeMatcher::attr_equals(ROLE_ATTR, "user"),
            NodeMatcher::attr_equals(ROLE_ATTR, "assistant"),
        ),
        RoleTier::new(
            "role-substr",
            NodeMatcher::attr_contains(ROLE_ATTR, "user"),
            NodeMatcher::attr_contains(ROLE_ATTR, "assistant"),
        ),
    ]
}

impl ChatGptResolver {
    /// Role-marked content nodes that live inside an `article` shell, in
    /// document order. Content rendered outside an article (composer
    /// previews, quoted snippets) is not a turn.
    fn role_contents(&self, page: &PageTree, role: &str) -> Vec<NodeId> {
        let content = NodeMatcher::attr_equals(ROLE_ATTR, role);
        let article = NodeMatcher::tag("article");
        page.query_all(page.root(), &content, false)
            .into_iter()
            .filter(|&node| page.closest(node, &article).is_some())
            .collect()
    }
}

impl TurnResolver for ChatGptResolver {
    fn provider(&self) -> &'static str {
        "chatgpt"
    }

    fn origin_matches(&self, origin: &str) -> bool {
        origin.contains("chatgpt.com") || origin.contains("chat.openai.com")
    }

    fn resolve_turns(&self, page: &PageTree) -> Vec<ResolvedTurn> {
        let prompts = self.role_contents(page, "user");
        let responses = self.role_contents(page, "assistant");
        let turns: Vec<ResolvedTurn> = prompts
            .into_iter()
            .zip(responses)
            .map(|(prompt, response)| ResolvedTurn {
                native_id: page
                    .attribute(prompt, MESSAGE_ID_ATTR)
                    .map(|id| format!("chatgpt-m-{id}")),
                prompt,
                response,
                strategy: "article",
            })
            .collect();
        if !turns.is_empty() {
            return turns;
        }
        // A layout change that drops the article shells degrades to plain
        // role pairing instead of an empty list.
        resolve_role_tiers(page, &fallback_tiers(), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_message(page: &mut PageTree, role: &str, text: &str) -> NodeId {
        let root = page.root();
        let article = page.create_element("article");
        page.append_child(root, article);
        let content = page.create_element("div");
        page.set_attribute(content, ROLE_ATTR, role);
        page.set_text(content, text);
        page.append_child(article, content);
        content
    }

    #[test]
    fn pairs_role_contents_by_document_order() {
        let mut page = PageTree::new();
        let u1 = add_message(&mut page, "user", "first question");
        let a1 = add_message(&mut page, "assistant", "first answer");
        let u2 = add_message(&mut page, "user", "second question");
        let a2 = add_message(&mut page, "assistant", "second answer");

        let turns = ChatGptResolver.resolve_turns(&page);
        assert_eq!(turns.len(), 2);
        assert_eq!((turns[0].prompt, turns[0].response), (u1, a1));
        assert_eq!((turns[1].prompt, turns[1].response), (u2, a2));
        assert!(turns.iter().all(|t| t.strategy == "article"));
    }

    #[test]
    fn trailing_unanswered_prompt_is_dropped() {
        let mut page = PageTree::new();
        add_message(&mut page, "user", "answered");
        add_message(&mut page, "assistant", "answer");
        add_message(&mut page, "user", "still streaming");

        assert_eq!(ChatGptResolver.resolve_turns(&page).len(), 1);
    }

    #[test]
    fn article_pairing_wins_over_loose_content() {
        let mut page = PageTree::new();
        let root = page.root();
        let loose = page.create_element("div");
        page.set_attribute(loose, ROLE_ATTR, "user");
        page.append_child(root, loose);
        add_message(&mut page, "user", "in article");
        add_message(&mut page, "assistant", "answer");

        let turns = ChatGptResolver.resolve_turns(&page);
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].strategy, "article");
    }

    #[test]
    fn falls_back_to_role_pairing_without_article_shells() {
        let mut page = PageTree::new();
        let root = page.root();
        let user = page.create_element("div");
        page.set_attribute(user, ROLE_ATTR, "user");
        page.append_child(root, user);
        let assistant = page.create_element("div");
        page.set_attribute(assistant, ROLE_ATTR, "assistant");
        page.append_child(root, assistant);

        let turns = ChatGptResolver.resolve_turns(&page);
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].strategy, "role-attr");
    }

    #[test]
    fn message_ids_become_native_ids() {
        let mut page = PageTree::new();
        let prompt = add_message(&mut page, "user", "q");
        add_message(&mut page, "assistant", "a");
        page.set_attribute(prompt, MESSAGE_ID_ATTR, "abc123");

        let turns = ChatGptResolver.resolve_turns(&page);
        assert_eq!(turns[0].native_id.as_deref(), Some("chatgpt-m-abc123"));
    }

    #[test]
    fn origin_match_covers_both_hosts() {
        assert!(ChatGptResolver.origin_matches("https://chatgpt.com/c/1"));
        assert!(ChatGptResolver.origin_matches("https://chat.openai.com/"));
        assert!(!ChatGptResolver.origin_matches("https://gemini.google.com/"));
    }
}
