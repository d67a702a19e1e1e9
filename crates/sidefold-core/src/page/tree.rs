//! Arena model of the host page's document structure.
//!
//! The host page is owned and mutated by code outside this system. The
//! embedding keeps a `PageTree` in sync with it and hands the engine shared
//! access; the engine only reads the tree and locally decorates it (fold
//! controls, clip styles, placeholders).
//!
//! Two properties of the external contract shape this type:
//!
//! - References into the tree are non-owning and may dangle at any time
//!   (virtualization, re-renders). `NodeId` is a generational index; every
//!   operation on a stale id degrades to a no-op/`None`, never a panic.
//! - Change notification is the engine's only scheduling signal. Structural
//!   mutations (child lists) and text changes bump a revision published via
//!   a watch channel. Style and attribute writes do not notify — they are
//!   the engine's own decoration channel and must not retrigger resyncs.

use std::collections::BTreeMap;

use tokio::sync::watch;

use super::matcher::NodeMatcher;

/// A non-owning reference to a node in a [`PageTree`].
///
/// Stale ids (the node was removed, possibly replaced by a re-render) are
/// detected via the generation counter and treated as "not found".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Default)]
struct NodeData {
    tag: String,
    attrs: BTreeMap<String, String>,
    text: Option<String>,
    styles: BTreeMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Root of an isolated embedded fragment hosted by this node. Not part
    /// of `children`; normal traversal does not descend into it.
    fragment: Option<NodeId>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

/// Mutable arena tree standing in for the host document.
#[derive(Debug)]
pub struct PageTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    revision: u64,
    revision_tx: watch::Sender<u64>,
    scroll_target: Option<NodeId>,
}

impl PageTree {
    /// Creates an empty tree with a `body` root element.
    pub fn new() -> Self {
        let (revision_tx, _) = watch::channel(0);
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            revision: 0,
            revision_tx,
            scroll_target: None,
        };
        tree.root = tree.create_element("body");
        tree
    }

    /// The root element of the tree.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Current revision counter; bumped on every notifying mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Subscribes to change notifications. The receiver observes the latest
    /// revision only — bursts coalesce naturally.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision_tx.subscribe()
    }

    fn notify(&mut self) {
        self.revision += 1;
        let _ = self.revision_tx.send(self.revision);
    }

    fn data(&self, id: NodeId) -> Option<&NodeData> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.data.as_ref()
    }

    fn data_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.data.as_mut()
    }

    /// Returns true if the id still refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.data(id).is_some()
    }

    // ------------------------------------------------------------------
    // Construction and structural mutation
    // ------------------------------------------------------------------

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        let data = NodeData {
            tag: tag.into(),
            ..NodeData::default()
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.data = Some(data);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                data: Some(data),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    /// Appends `child` as the last child of `parent`. No-op on stale ids or
    /// if the child is already attached elsewhere.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.attach(parent, child, None)
    }

    /// Inserts `child` as the first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.attach(parent, child, Some(0))
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, position: Option<usize>) -> bool {
        if parent == child || !self.is_alive(parent) {
            return false;
        }
        match self.data(child) {
            Some(data) if data.parent.is_none() => {}
            _ => return false,
        }
        {
            let parent_data = self.data_mut(parent).expect("parent checked alive");
            match position {
                Some(at) if at <= parent_data.children.len() => {
                    parent_data.children.insert(at, child)
                }
                _ => parent_data.children.push(child),
            }
        }
        self.data_mut(child).expect("child checked alive").parent = Some(parent);
        self.notify();
        true
    }

    /// Removes a node and its entire subtree (including fragments),
    /// invalidating every id inside it.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root || !self.is_alive(id) {
            return false;
        }
        if let Some(parent) = self.data(id).and_then(|d| d.parent) {
            if let Some(parent_data) = self.data_mut(parent) {
                parent_data.children.retain(|&c| c != id);
                if parent_data.fragment == Some(id) {
                    parent_data.fragment = None;
                }
            }
        }
        self.free_subtree(id);
        self.notify();
        true
    }

    fn free_subtree(&mut self, id: NodeId) {
        let Some(data) = self.data(id) else { return };
        let mut pending: Vec<NodeId> = data.children.clone();
        if let Some(fragment) = data.fragment {
            pending.push(fragment);
        }
        for child in pending {
            self.free_subtree(child);
        }
        let slot = &mut self.slots[id.index as usize];
        slot.data = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
    }

    /// Attaches an isolated embedded fragment to `host` and returns its
    /// root. At most one fragment per host; an existing fragment root is
    /// returned as-is.
    pub fn attach_fragment(&mut self, host: NodeId) -> Option<NodeId> {
        if let Some(existing) = self.data(host)?.fragment {
            return Some(existing);
        }
        let fragment = self.create_element("#fragment");
        self.data_mut(fragment).expect("fresh node").parent = Some(host);
        self.data_mut(host)?.fragment = Some(fragment);
        self.notify();
        Some(fragment)
    }

    // ------------------------------------------------------------------
    // Content and decoration
    // ------------------------------------------------------------------

    /// Sets the node's own text. Text changes notify subscribers.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> bool {
        let Some(data) = self.data_mut(id) else {
            return false;
        };
        data.text = Some(text.into());
        self.notify();
        true
    }

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> bool {
        match self.data_mut(id) {
            Some(data) => {
                data.attrs.insert(name.into(), value.into());
                true
            }
            None => false,
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> bool {
        match self.data_mut(id) {
            Some(data) => data.attrs.remove(name).is_some(),
            None => false,
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.data(id)?.attrs.get(name).map(String::as_str)
    }

    /// Adds a class to the whitespace-separated `class` attribute.
    pub fn add_class(&mut self, id: NodeId, class: &str) -> bool {
        let Some(data) = self.data_mut(id) else {
            return false;
        };
        let entry = data.attrs.entry("class".to_string()).or_default();
        if !entry.split_whitespace().any(|c| c == class) {
            if !entry.is_empty() {
                entry.push(' ');
            }
            entry.push_str(class);
        }
        true
    }

    /// Removes a class from the `class` attribute.
    pub fn remove_class(&mut self, id: NodeId, class: &str) -> bool {
        let Some(data) = self.data_mut(id) else {
            return false;
        };
        if let Some(current) = data.attrs.get("class") {
            let next = current
                .split_whitespace()
                .filter(|c| *c != class)
                .collect::<Vec<_>>()
                .join(" ");
            data.attrs.insert("class".to_string(), next);
        }
        true
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attribute(id, "class")
            .is_some_and(|v| v.split_whitespace().any(|c| c == class))
    }

    /// Sets an inline style property. Styles are local decoration and do
    /// not notify subscribers.
    pub fn set_style(&mut self, id: NodeId, name: impl Into<String>, value: impl Into<String>) -> bool {
        match self.data_mut(id) {
            Some(data) => {
                data.styles.insert(name.into(), value.into());
                true
            }
            None => false,
        }
    }

    pub fn clear_style(&mut self, id: NodeId, name: &str) -> bool {
        match self.data_mut(id) {
            Some(data) => data.styles.remove(name).is_some(),
            None => false,
        }
    }

    pub fn style(&self, id: NodeId, name: &str) -> Option<&str> {
        self.data(id)?.styles.get(name).map(String::as_str)
    }

    /// Records a scroll request for the host bridge to consume. Viewport
    /// motion itself belongs to the presentation layer.
    pub fn scroll_into_view(&mut self, id: NodeId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        self.scroll_target = Some(id);
        true
    }

    pub fn last_scroll_target(&self) -> Option<NodeId> {
        self.scroll_target
    }

    // ------------------------------------------------------------------
    // Reads and traversal
    // ------------------------------------------------------------------

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.data(id).map(|d| d.tag.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.data(id).map(|d| d.children.clone()).unwrap_or_default()
    }

    /// The embedded fragment root hosted by this node, if any.
    pub fn fragment(&self, id: NodeId) -> Option<NodeId> {
        self.data(id)?.fragment
    }

    /// Walks `parent` links to check containment (fragment roots count as
    /// contained in their host).
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Nearest ancestor (including self) matching the matcher.
    pub fn closest(&self, id: NodeId, matcher: &NodeMatcher) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.matches(node, matcher) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Evaluates a matcher against a single node.
    pub fn matches(&self, id: NodeId, matcher: &NodeMatcher) -> bool {
        match self.data(id) {
            Some(data) => matcher.matches(&data.tag, &data.attrs),
            None => false,
        }
    }

    /// Document-order descendants of `scope` (excluding `scope` itself).
    /// `pierce` also descends into embedded fragments.
    pub fn descendants(&self, scope: NodeId, pierce: bool) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(scope, pierce, &mut out);
        out
    }

    fn collect_descendants(&self, id: NodeId, pierce: bool, out: &mut Vec<NodeId>) {
        let Some(data) = self.data(id) else { return };
        let visit = |child: NodeId, out: &mut Vec<NodeId>| {
            out.push(child);
            self.collect_descendants(child, pierce, out);
        };
        if pierce {
            if let Some(fragment) = data.fragment {
                visit(fragment, out);
            }
        }
        for &child in &data.children {
            visit(child, out);
        }
    }

    /// All descendants of `scope` matching the matcher, in document order.
    pub fn query_all(&self, scope: NodeId, matcher: &NodeMatcher, pierce: bool) -> Vec<NodeId> {
        self.descendants(scope, pierce)
            .into_iter()
            .filter(|&id| self.matches(id, matcher))
            .collect()
    }

    /// First descendant of `scope` matching the matcher.
    pub fn query_first(&self, scope: NodeId, matcher: &NodeMatcher, pierce: bool) -> Option<NodeId> {
        self.descendants(scope, pierce)
            .into_iter()
            .find(|&id| self.matches(id, matcher))
    }

    /// Concatenated text of the node and its descendants in document order,
    /// one segment per line. Embedded fragments are excluded, matching the
    /// host document's own text extraction.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        self.collect_text(id, &mut segments);
        segments.join("\n")
    }

    fn collect_text(&self, id: NodeId, out: &mut Vec<String>) {
        let Some(data) = self.data(id) else { return };
        if let Some(text) = &data.text {
            if !text.is_empty() {
                out.push(text.clone());
            }
        }
        for &child in &data.children {
            self.collect_text(child, out);
        }
    }
}

impl Default for PageTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child_with_text(tree: &mut PageTree, parent: NodeId, tag: &str, text: &str) -> NodeId {
        let node = tree.create_element(tag);
        tree.set_text(node, text);
        tree.append_child(parent, node);
        node
    }

    #[test]
    fn structural_mutations_bump_revision() {
        let mut tree = PageTree::new();
        let before = tree.revision();
        let node = tree.create_element("div");
        assert_eq!(tree.revision(), before, "detached create does not notify");
        tree.append_child(tree.root(), node);
        assert!(tree.revision() > before);
    }

    #[test]
    fn style_and_attribute_writes_do_not_notify() {
        let mut tree = PageTree::new();
        let node = tree.create_element("div");
        tree.append_child(tree.root(), node);
        let before = tree.revision();
        tree.set_style(node, "max-height", "40px");
        tree.set_attribute(node, "aria-expanded", "false");
        tree.add_class(node, "oa-folded");
        assert_eq!(tree.revision(), before);
    }

    #[test]
    fn stale_ids_are_harmless() {
        let mut tree = PageTree::new();
        let node = tree.create_element("div");
        tree.append_child(tree.root(), node);
        assert!(tree.remove(node));
        assert!(!tree.is_alive(node));
        assert!(!tree.set_text(node, "late"));
        assert!(!tree.set_style(node, "overflow", "hidden"));
        assert!(tree.attribute(node, "class").is_none());
        assert!(!tree.scroll_into_view(node));
    }

    #[test]
    fn removed_slot_reuse_does_not_resurrect_old_ids() {
        let mut tree = PageTree::new();
        let old = tree.create_element("div");
        tree.append_child(tree.root(), old);
        tree.remove(old);
        let new = tree.create_element("span");
        tree.append_child(tree.root(), new);
        // Slot is recycled, but the stale id must not alias the new node.
        assert!(!tree.is_alive(old));
        assert_eq!(tree.tag(new), Some("span"));
    }

    #[test]
    fn fragments_are_isolated_from_plain_traversal() {
        let mut tree = PageTree::new();
        let host = tree.create_element("ucs-fast-markdown");
        tree.append_child(tree.root(), host);
        let fragment = tree.attach_fragment(host).unwrap();
        let inner = child_with_text(&mut tree, fragment, "div", "hidden in fragment");
        tree.add_class(inner, "markdown-document");

        let matcher = NodeMatcher::class("markdown-document");
        assert!(tree.query_first(tree.root(), &matcher, false).is_none());
        assert_eq!(tree.query_first(tree.root(), &matcher, true), Some(inner));
        assert_eq!(tree.text_content(host), "");
        assert!(tree.contains(host, inner));
    }

    #[test]
    fn text_content_joins_descendants_in_document_order() {
        let mut tree = PageTree::new();
        let wrapper = tree.create_element("div");
        tree.append_child(tree.root(), wrapper);
        child_with_text(&mut tree, wrapper, "p", "first line");
        child_with_text(&mut tree, wrapper, "p", "second line");
        assert_eq!(tree.text_content(wrapper), "first line\nsecond line");
    }

    #[test]
    fn closest_walks_ancestors() {
        let mut tree = PageTree::new();
        let article = tree.create_element("article");
        tree.append_child(tree.root(), article);
        let inner = tree.create_element("div");
        tree.append_child(article, inner);
        assert_eq!(tree.closest(inner, &NodeMatcher::tag("article")), Some(article));
        assert_eq!(tree.closest(inner, &NodeMatcher::tag("section")), None);
    }

    #[test]
    fn watch_subscriber_sees_latest_revision() {
        let mut tree = PageTree::new();
        let rx = tree.subscribe();
        let a = tree.create_element("div");
        let b = tree.create_element("div");
        tree.append_child(tree.root(), a);
        tree.append_child(tree.root(), b);
        assert_eq!(*rx.borrow(), tree.revision());
    }
}
