//! Fold application: clip/unclip response regions and keep the recorded
//! intent re-applicable after every resync pass.

use super::model::{FoldState, TurnRecord};
use super::normalizer::FOLD_CONTROL_CLASS;
use super::resolver::TurnResolver;
use crate::page::{NodeId, NodeMatcher, PageTree};

/// Class of the injected folded-state placeholder.
pub const PLACEHOLDER_CLASS: &str = "oa-fold-placeholder";

/// Placeholder label shown while a response is folded.
pub const PLACEHOLDER_TEXT: &str = "AI Response (Click to expand)";

/// Class toggled on the fold control while folded.
pub const FOLDED_CLASS: &str = "oa-folded";

const FOLD_MAX_HEIGHT: &str = "40px";

/// Owns [`FoldState`] and applies it to the page.
///
/// All operations are idempotent: re-applying the same state over an
/// already-decorated region changes nothing, which is what lets the resync
/// pass blindly re-apply after every rebuild.
#[derive(Debug, Default)]
pub struct FoldController {
    state: FoldState,
}

impl FoldController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FoldState {
        &self.state
    }

    pub fn is_folded(&self, id: &str) -> bool {
        self.state.is_folded(id)
    }

    /// Records intent for `id` and immediately applies it if the turn is
    /// present in the latest list. An id the tree transiently lacks is a
    /// no-op beyond the recorded state.
    pub fn toggle_fold(
        &mut self,
        page: &mut PageTree,
        resolver: &dyn TurnResolver,
        turns: &[TurnRecord],
        id: &str,
        folded: bool,
    ) {
        self.state.set(id, folded);
        if let Some(turn) = turns.iter().find(|t| t.id == id) {
            self.apply_fold(page, resolver, turn.response, folded);
        }
    }

    /// Re-applies recorded intent for every turn in a freshly normalized
    /// list (the post-resync path).
    pub fn reapply(&self, page: &mut PageTree, resolver: &dyn TurnResolver, turns: &[TurnRecord]) {
        for turn in turns {
            self.apply_fold(page, resolver, turn.response, self.state.is_folded(&turn.id));
        }
    }

    /// Applies a folded/expanded presentation to a response region.
    ///
    /// Folding clips the resolver's fold target — which may live inside an
    /// embedded fragment; clipping the outer shell there would also clip
    /// the fold control — and ensures exactly one placeholder indicator.
    /// Unfolding removes the clip and every placeholder.
    pub fn apply_fold(
        &self,
        page: &mut PageTree,
        resolver: &dyn TurnResolver,
        response: NodeId,
        folded: bool,
    ) {
        let target = resolver.fold_target(page, response);
        if !page.is_alive(target) {
            return;
        }

        let placeholder_matcher = NodeMatcher::class(PLACEHOLDER_CLASS);
        let placeholders = page.query_all(target, &placeholder_matcher, false);

        if folded {
            page.set_style(target, "max-height", FOLD_MAX_HEIGHT);
            page.set_style(target, "overflow", "hidden");
            page.set_style(target, "position", "relative");
            if placeholders.is_empty() {
                let placeholder = page.create_element("div");
                page.add_class(placeholder, PLACEHOLDER_CLASS);
                page.set_text(placeholder, PLACEHOLDER_TEXT);
                page.append_child(target, placeholder);
            } else {
                for &extra in &placeholders[1..] {
                    page.remove(extra);
                }
            }
        } else {
            page.clear_style(target, "max-height");
            page.clear_style(target, "overflow");
            page.clear_style(target, "position");
            for placeholder in placeholders {
                page.remove(placeholder);
            }
        }

        // Mirror state onto the control in the outer region so the
        // presentation layer can restyle it.
        if let Some(control) = page.query_first(response, &NodeMatcher::class(FOLD_CONTROL_CLASS), false)
        {
            if folded {
                page.add_class(control, FOLDED_CLASS);
                page.set_attribute(control, "aria-expanded", "false");
            } else {
                page.remove_class(control, FOLDED_CLASS);
                page.set_attribute(control, "aria-expanded", "true");
            }
        }
    }
}
