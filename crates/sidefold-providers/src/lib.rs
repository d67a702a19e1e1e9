//! Provider resolvers and the origin registry.
//!
//! One resolver per supported chat host; selection happens once at
//! startup by matching the page origin. Unmatched origins are fatal for
//! the caller, not silently ignored.

pub mod chatgpt;
pub mod gemini;

use std::sync::Arc;

use sidefold_core::turn::TurnResolver;

pub use chatgpt::ChatGptResolver;
pub use gemini::GeminiResolver;

/// Selects the resolver for a host origin, first match wins.
pub fn resolver_for_origin(origin: &str) -> Option<Arc<dyn TurnResolver>> {
    let resolvers: [Arc<dyn TurnResolver>; 2] =
        [Arc::new(ChatGptResolver), Arc::new(GeminiResolver)];
    resolvers
        .into_iter()
        .find(|resolver| resolver.origin_matches(origin))
}
