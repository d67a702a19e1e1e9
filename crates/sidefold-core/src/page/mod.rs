//! Read/query model of the host page.
//!
//! - `tree`: generational arena tree with change notification
//! - `matcher`: declarative structural matchers used by resolvers

mod matcher;
mod tree;

pub use matcher::NodeMatcher;
pub use tree::{NodeId, PageTree};
