//! Fast-download whitelisting for game servers.
//!
//! A host plugin forwards every precached resource to [`FastdlEngine`],
//! which decides from the session's rules whether the file is served by an
//! external HTTP mirror, keeps the accepted set, and publishes it as a
//! manifest the mirroring job reads. The download URL clients should use is
//! handed back at `init`.
//!
//! # Architecture
//!
//! - `engine.rs` - Session lifecycle: `init`, `classify_and_insert`, `deinit`
//! - `diagnostics.rs` - [`Diagnostic`] events and the [`DiagnosticSink`] seam
//! - `ffi.rs` - C ABI over one process-wide engine
//!
//! Lower layers live in their own crates: `fastdl-config` (file loading and
//! URL resolution), `fastdl-whitelist` (paths, rules, the set) and
//! `fastdl-manifest` (atomic publishing).
//!
//! ```no_run
//! use std::path::Path;
//!
//! let mut engine = fastdl::FastdlEngine::new();
//! let mut url = [0u8; 256];
//! let copy = engine.init(Path::new("addons/fastdl"), Path::new("valve"), &mut url)?;
//! engine.classify_and_insert("sound", "ambience/wind.wav");
//! engine.deinit();
//! # let _ = copy;
//! # Ok::<(), fastdl::EngineError>(())
//! ```

pub use diagnostics::{Diagnostic, DiagnosticSink, Level, TracingSink};
pub use engine::{FastdlEngine, UrlCopy};
pub use error::{EngineError, Result};
pub use fastdl_config::{ConfigError, ConfigWarning, SessionConfig};
pub use fastdl_manifest::{FlushPolicy, ManifestError, ManifestFormat};
pub use fastdl_whitelist::{CaseFolding, ResourceCategory, WhitelistEntry, WhitelistSet};

mod diagnostics;
mod engine;
mod error;
pub mod ffi;
