//! Structural matchers over page-tree nodes.
//!
//! Providers describe what a prompt or response region looks like with a
//! small declarative vocabulary instead of hard-coded traversal. Each
//! resolver carries an ordered list of fallback tiers built from these
//! matchers, so a markup change on the host degrades to the next tier
//! rather than failing outright.

use std::collections::BTreeMap;

/// A predicate over a single node's tag and attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeMatcher {
    /// Tag name equals (case-sensitive; host tags are normalized lowercase).
    Tag(String),
    /// Attribute is present, regardless of value.
    AttrPresent(String),
    /// Attribute equals the given value exactly.
    AttrEquals(String, String),
    /// Attribute value contains the given substring.
    AttrContains(String, String),
    /// The whitespace-separated `class` attribute contains the given class.
    Class(String),
    /// Any of the inner matchers match (a selector list).
    AnyOf(Vec<NodeMatcher>),
}

impl NodeMatcher {
    pub fn tag(name: impl Into<String>) -> Self {
        Self::Tag(name.into())
    }

    pub fn attr_present(name: impl Into<String>) -> Self {
        Self::AttrPresent(name.into())
    }

    pub fn attr_equals(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::AttrEquals(name.into(), value.into())
    }

    pub fn attr_contains(name: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::AttrContains(name.into(), needle.into())
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::Class(name.into())
    }

    pub fn any_of(matchers: impl IntoIterator<Item = NodeMatcher>) -> Self {
        Self::AnyOf(matchers.into_iter().collect())
    }

    /// Evaluates the matcher against a node's tag and attribute map.
    pub fn matches(&self, tag: &str, attrs: &BTreeMap<String, String>) -> bool {
        match self {
            Self::Tag(name) => tag == name,
            Self::AttrPresent(name) => attrs.contains_key(name),
            Self::AttrEquals(name, value) => attrs.get(name).is_some_and(|v| v == value),
            Self::AttrContains(name, needle) => {
                attrs.get(name).is_some_and(|v| v.contains(needle.as_str()))
            }
            Self::Class(name) => attrs
                .get("class")
                .is_some_and(|v| v.split_whitespace().any(|c| c == name)),
            Self::AnyOf(matchers) => matchers.iter().any(|m| m.matches(tag, attrs)),
        }
    }
}
