//! Session configuration for fastdl.
//!
//! # Architecture
//!
//! - `entries.rs` - Text to `key = value` pairs; whole-file TOML, else line by line
//! - `file.rs` - `fastdl.toml` loading, key by key, with per-entry recovery
//! - `session.rs` - Immutable [`SessionConfig`] snapshot and its defaults
//! - `url.rs` - `%game%` expansion and URL validation
//!
//! Loading never aborts a session. A missing file yields defaults; an unreadable line is
//! skipped; a broken value is replaced by its default; a broken rule is skipped. Every such
//! decision comes back as a [`ConfigWarning`] for the caller to report.

pub use error::{ConfigError, ConfigWarning, Result};
pub use file::{Loaded, load, load_or_default, parse};
pub use session::SessionConfig;
pub use url::{game_name, resolve_url};

mod entries;
mod error;
mod file;
mod session;
mod url;

/// File read from the config directory.
pub const CONFIG_FILE_NAME: &str = "fastdl.toml";

/// URL advertised when none is configured or the configured one is invalid.
pub const DEFAULT_DOWNLOAD_URL: &str = "http://localhost/%game%/";

/// Manifest file name, relative to the config directory, when none is set.
pub const DEFAULT_MANIFEST_NAME: &str = "fastdl_whitelist.txt";
