//! Turn normalization: resolver output → canonical turn list.
//!
//! Runs the provider resolver, assigns best-effort stable identities,
//! derives summaries, merges fold intent, and idempotently injects the
//! fold-toggle control into both regions. Records are rebuilt from scratch
//! every pass; running twice on an unchanged tree yields identical ids and
//! summaries.

use std::collections::HashSet;
use std::sync::Arc;

use super::model::{FoldState, TurnRecord, TurnRole};
use super::resolver::TurnResolver;
use crate::page::{NodeId, NodeMatcher, PageTree};

/// Maximum summary length, in characters.
pub const SUMMARY_MAX_CHARS: usize = 80;

/// Summary used when text extraction yields nothing.
pub const DEFAULT_SUMMARY: &str = "User prompt";

/// Class of the injected fold-toggle control.
pub const FOLD_CONTROL_CLASS: &str = "oa-fold-btn";

/// Attribute carrying the turn id on the injected control.
pub const FOLD_ID_ATTR: &str = "data-fold-id";

/// Produces the ordered turn list for the current state of the page.
pub struct TurnNormalizer {
    resolver: Arc<dyn TurnResolver>,
}

impl TurnNormalizer {
    pub fn new(resolver: Arc<dyn TurnResolver>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &Arc<dyn TurnResolver> {
        &self.resolver
    }

    /// One normalization pass. Bounded by the number of turns currently in
    /// the tree; assumes neither a fixed turn count nor a single container.
    pub fn normalize(&self, page: &mut PageTree, fold: &FoldState) -> Vec<TurnRecord> {
        let resolved = self.resolver.resolve_turns(page);
        let mut seen: HashSet<String> = HashSet::with_capacity(resolved.len());
        let mut records = Vec::with_capacity(resolved.len());

        for (index, turn) in resolved.into_iter().enumerate() {
            let mut id = match &turn.native_id {
                Some(native) => native.clone(),
                // Positional fallback, scoped by strategy so a mid-session
                // strategy switch cannot alias unrelated turns.
                None => format!("{}-{}-{}", self.resolver.provider(), turn.strategy, index),
            };
            // Per-pass uniqueness: a duplicated native id is disambiguated
            // by position rather than dropped.
            if !seen.insert(id.clone()) {
                id = format!("{id}-{index}");
                seen.insert(id.clone());
            }

            let source = self.resolver.summary_source(page, turn.prompt);
            let summary = extract_summary(&page.text_content(source));

            ensure_fold_control(page, turn.prompt, &id);
            ensure_fold_control(page, turn.response, &id);

            records.push(TurnRecord {
                folded: fold.is_folded(&id),
                id,
                role: TurnRole::User,
                summary,
                prompt: turn.prompt,
                response: turn.response,
            });
        }

        records
    }
}

/// First non-empty line, trimmed, truncated to [`SUMMARY_MAX_CHARS`]
/// characters; falls back to [`DEFAULT_SUMMARY`].
fn extract_summary(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(truncate_chars)
        .unwrap_or_else(|| DEFAULT_SUMMARY.to_string())
}

fn truncate_chars(line: &str) -> String {
    match line.char_indices().nth(SUMMARY_MAX_CHARS) {
        Some((byte_index, _)) => line[..byte_index].to_string(),
        None => line.to_string(),
    }
}

/// Ensures exactly one fold-toggle control exists inside the region. An
/// existing control is retagged if the turn id changed; it is never
/// duplicated across passes.
fn ensure_fold_control(page: &mut PageTree, region: NodeId, id: &str) {
    if !page.is_alive(region) {
        return;
    }
    let matcher = NodeMatcher::class(FOLD_CONTROL_CLASS);
    if let Some(existing) = page.query_first(region, &matcher, false) {
        if page.attribute(existing, FOLD_ID_ATTR) != Some(id) {
            page.set_attribute(existing, FOLD_ID_ATTR, id);
        }
        return;
    }
    let control = page.create_element("button");
    page.add_class(control, FOLD_CONTROL_CLASS);
    page.set_attribute(control, "type", "button");
    page.set_attribute(control, FOLD_ID_ATTR, id);
    page.set_attribute(control, "aria-expanded", "true");
    page.prepend_child(region, control);
}
