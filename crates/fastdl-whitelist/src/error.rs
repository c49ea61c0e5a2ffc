use thiserror::Error;

/// Why a single whitelist rule was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RuleParseError {
    #[error("empty rule")]
    Empty,

    #[error("unknown rule action '{0}', expected 'include' or 'exclude'")]
    UnknownPolarity(String),

    #[error("unknown resource category '{0}', expected 'model', 'sound', 'generic' or '*'")]
    UnknownCategory(String),

    #[error("rule has no pattern")]
    MissingPattern,

    #[error("unexpected trailing input '{0}'")]
    TrailingInput(String),

    #[error("pattern '{0}' uses a wildcard outside a trailing '/*'")]
    UnsupportedWildcard(String),

    #[error("pattern '{0}' is empty after normalization; use '*' to match every path")]
    EmptyPattern(String),

    #[error("malformed rule table: {0}")]
    Table(String),
}
