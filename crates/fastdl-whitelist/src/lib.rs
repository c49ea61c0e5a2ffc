//! Resource classification for fast-download whitelisting.
//!
//! # Architecture
//!
//! - `category.rs` - Resource kinds and hint/extension inference
//! - `path.rs` - Comparison-stable path keys
//! - `rule.rs` - Ordered include/exclude rules, first match wins
//! - `set.rs` - Deduplicated, insertion-ordered whitelist
//!
//! Nothing here touches the filesystem. Paths are compared as strings only,
//! so `..` segments are kept as written.

pub use category::ResourceCategory;
pub use error::RuleParseError;
pub use path::{CaseFolding, NormalizedPath, PathNormalizer};
pub use rule::{CategoryFilter, Polarity, RulePattern, RuleSet, RuleSpec, Verdict, WhitelistRule};
pub use set::{WhitelistEntry, WhitelistSet};

mod category;
mod error;
mod path;
mod rule;
mod set;
