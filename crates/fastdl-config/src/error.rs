use std::path::PathBuf;

use fastdl_whitelist::RuleParseError;
use thiserror::Error;

/// Configuration that could not be used. Never fatal to a session: the
/// loader substitutes defaults for whatever failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("download URL is empty")]
    EmptyUrl,

    #[error("download URL '{url}' is invalid: {reason}")]
    InvalidUrl { url: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Recoverable problems found while loading; each one is reported and then
/// worked around.
#[derive(Debug, Error)]
pub enum ConfigWarning {
    #[error("no config at '{}', using the default URL and allowing every resource", path.display())]
    MissingFile { path: PathBuf },

    #[error("config unusable, falling back to defaults: {0}")]
    Fallback(#[source] ConfigError),

    #[error("download URL rejected, using '{fallback}': {error}")]
    UrlRejected {
        #[source]
        error: ConfigError,
        fallback: String,
    },

    #[error("config line {line} '{text}' skipped: {reason}")]
    MalformedLine {
        line: usize,
        text: String,
        reason: &'static str,
    },

    #[error("rule #{index} '{text}' skipped: {reason}")]
    RuleSkipped {
        index: usize,
        text: String,
        #[source]
        reason: RuleParseError,
    },

    #[error("no usable whitelist rules; nothing will be advertised for fast download")]
    NoRules,

    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("unknown config key '{0}' ignored")]
    UnknownKey(String),
}
