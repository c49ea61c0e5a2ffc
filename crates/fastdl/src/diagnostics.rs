//! Everything the engine wants the operator to know, routed through a
//! caller-supplied sink instead of a global logger.

use std::path::PathBuf;

use fastdl_config::ConfigWarning;
use fastdl_manifest::ManifestError;
use thiserror::Error;

use crate::error::EngineError;

/// Severity, numbered as the C ABI reports it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

#[derive(Debug, Error)]
pub enum Diagnostic {
    #[error(transparent)]
    Config(#[from] ConfigWarning),

    #[error(
        "fastdl session started: download URL '{download_url}', {rules} rule(s), manifest '{}'",
        manifest.display()
    )]
    SessionStarted {
        download_url: String,
        rules: usize,
        manifest: PathBuf,
    },

    #[error("fastdl session ended: {entries} resource(s) whitelisted in '{}'", manifest.display())]
    SessionEnded { entries: usize, manifest: PathBuf },

    #[error("download URL truncated to {capacity} of {full_len} bytes")]
    UrlTruncated { full_len: usize, capacity: usize },

    #[error("{operation} ignored: no active session")]
    NotActive { operation: &'static str },

    #[error("{operation} refused: {error}")]
    Refused {
        operation: &'static str,
        #[source]
        error: EngineError,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("resource '{path}' dropped: {reason}")]
    PathRejected { path: String, reason: &'static str },

    #[error("unknown precache hint '{hint}', category inferred from the file name")]
    UnknownHint { hint: String },

    #[error("{operation}: bad {argument}: {reason}")]
    InvalidArgument {
        operation: &'static str,
        argument: &'static str,
        reason: &'static str,
    },
}

impl Diagnostic {
    pub fn level(&self) -> Level {
        match self {
            Self::Config(ConfigWarning::MissingFile { .. }) => Level::Info,
            Self::Config(_)
            | Self::UrlTruncated { .. }
            | Self::Refused { .. }
            | Self::InvalidArgument { .. } => Level::Warn,
            Self::Manifest(_) => Level::Error,
            Self::SessionStarted { .. } | Self::SessionEnded { .. } => Level::Info,
            Self::NotActive { .. } | Self::PathRejected { .. } | Self::UnknownHint { .. } => {
                Level::Debug
            }
        }
    }
}

/// Receiver for engine diagnostics.
///
/// Called synchronously on the caller's thread, possibly on the precache hot
/// path; implementations should not block.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing`. Installs no subscriber.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.level() {
            Level::Debug => tracing::debug!(target: "fastdl", "{diagnostic}"),
            Level::Info => tracing::info!(target: "fastdl", "{diagnostic}"),
            Level::Warn => tracing::warn!(target: "fastdl", "{diagnostic}"),
            Level::Error => tracing::error!(target: "fastdl", "{diagnostic}"),
        }
    }
}

/// Keeps every diagnostic, for inspection in tests and tools.
impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}
