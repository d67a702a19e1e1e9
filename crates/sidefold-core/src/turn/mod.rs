//! Turn domain module.
//!
//! - `model`: canonical turn list types (`TurnRecord`, `FoldState`)
//! - `resolver`: provider resolver contract and tiered fallback helper
//! - `normalizer`: identity/summary derivation and control injection
//! - `fold`: fold intent application (`FoldController`)

mod fold;
mod model;
mod normalizer;
mod resolver;

pub use fold::{FoldController, FOLDED_CLASS, PLACEHOLDER_CLASS, PLACEHOLDER_TEXT};
pub use model::{FoldState, TurnRecord, TurnRole};
pub use normalizer::{
    TurnNormalizer, DEFAULT_SUMMARY, FOLD_CONTROL_CLASS, FOLD_ID_ATTR, SUMMARY_MAX_CHARS,
};
pub use resolver::{resolve_role_tiers, ResolvedTurn, RoleTier, TurnResolver};
