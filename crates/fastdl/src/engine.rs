use std::path::Path;

use fastdl_config::{Loaded, SessionConfig};
use fastdl_manifest::ManifestWriter;
use fastdl_whitelist::{ResourceCategory, WhitelistEntry, WhitelistSet};

use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::error::{EngineError, Result};

/// Outcome of copying the download URL into a caller buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UrlCopy {
    /// Bytes copied, always ending on a UTF-8 boundary.
    pub written: usize,
    /// Length of the full URL.
    pub full: usize,
}

impl UrlCopy {
    pub fn is_truncated(&self) -> bool {
        self.written < self.full
    }
}

#[derive(Debug)]
struct Session {
    config: SessionConfig,
    whitelist: WhitelistSet,
    writer: ManifestWriter,
}

/// One fast-download session at a time: `init`, any number of
/// `classify_and_insert` calls, then `deinit`. The engine can be reused.
///
/// Not internally synchronized; callers sharing an engine across threads
/// must wrap it themselves.
#[derive(Debug)]
pub struct FastdlEngine<S = TracingSink> {
    sink: S,
    session: Option<Session>,
}

impl FastdlEngine {
    pub fn new() -> Self {
        Self::with_sink(TracingSink)
    }
}

impl Default for FastdlEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: DiagnosticSink> FastdlEngine<S> {
    pub fn with_sink(sink: S) -> Self {
        Self { sink, session: None }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Download URL of the active session.
    pub fn download_url(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.config.download_url())
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.session.as_ref().map(|s| &s.config)
    }

    /// Resources accepted so far, in acceptance order.
    pub fn whitelist(&self) -> Option<&WhitelistSet> {
        self.session.as_ref().map(|s| &s.whitelist)
    }

    /// Start a session from `<config_dir>/fastdl.toml`.
    ///
    /// Configuration problems never fail this call: they are reported and
    /// replaced by defaults. The URL is copied into `out`, truncated to fit.
    pub fn init(&mut self, config_dir: &Path, game_dir: &Path, out: &mut [u8]) -> Result<UrlCopy> {
        if self.is_active() {
            return Err(EngineError::AlreadyActive);
        }

        let Loaded { config, warnings } = fastdl_config::load_or_default(config_dir, game_dir);
        for warning in warnings {
            self.sink.report(Diagnostic::Config(warning));
        }
        self.start(config, out)
    }

    /// Start a session from an already built configuration.
    pub fn init_with_config(&mut self, config: SessionConfig, out: &mut [u8]) -> Result<UrlCopy> {
        if self.is_active() {
            return Err(EngineError::AlreadyActive);
        }
        self.start(config, out)
    }

    fn start(&mut self, config: SessionConfig, out: &mut [u8]) -> Result<UrlCopy> {
        let mut writer = ManifestWriter::new(
            config.manifest_path(),
            config.manifest_format(),
            config.flush_policy(),
        );
        // Publish the empty manifest so the mirror never reads a stale one.
        if let Err(error) = writer.flush() {
            self.sink.report(Diagnostic::Manifest(error));
        }

        let copy = copy_truncated(config.download_url(), out);
        if copy.is_truncated() {
            self.sink.report(Diagnostic::UrlTruncated {
                full_len: copy.full,
                capacity: out.len(),
            });
        }

        self.sink.report(Diagnostic::SessionStarted {
            download_url: config.download_url().to_string(),
            rules: config.rules().len(),
            manifest: config.manifest_path().to_path_buf(),
        });

        self.session = Some(Session {
            config,
            whitelist: WhitelistSet::new(),
            writer,
        });
        Ok(copy)
    }

    /// Classify a precached resource and whitelist it if the rules allow.
    ///
    /// Returns whether the resource is whitelisted, including when it
    /// already was. Never fails; write errors are reported and retried at
    /// the next flush boundary.
    pub fn classify_and_insert(&mut self, hint: &str, raw_path: &str) -> bool {
        let Some(session) = self.session.as_mut() else {
            self.sink.report(Diagnostic::NotActive {
                operation: "classify_and_insert",
            });
            return false;
        };

        if let Some(reason) = rejection(raw_path) {
            self.sink.report(Diagnostic::PathRejected {
                path: raw_path.to_string(),
                reason,
            });
            return false;
        }

        let category = match ResourceCategory::from_hint(hint) {
            Some(category) => category,
            None => {
                if !hint.trim().is_empty() {
                    self.sink.report(Diagnostic::UnknownHint { hint: hint.to_string() });
                }
                ResourceCategory::infer_from_path(raw_path)
            }
        };

        let path = session.config.normalizer().normalize(raw_path, category);
        if path.is_empty() {
            self.sink.report(Diagnostic::PathRejected {
                path: raw_path.to_string(),
                reason: "no path segments",
            });
            return false;
        }

        let verdict = session.config.rules().evaluate(category, &path);
        if !verdict.is_included() {
            tracing::trace!(%category, %path, ?verdict, "resource not whitelisted");
            return false;
        }

        let entry = WhitelistEntry::new(category, path);
        if session.whitelist.contains(&entry) {
            return true;
        }
        if let Err(error) = session.writer.record(&entry) {
            self.sink.report(Diagnostic::Manifest(error));
        }
        session.whitelist.insert(entry);
        true
    }

    /// Publish the manifest now instead of at the next boundary.
    pub fn flush(&mut self) -> Result<()> {
        let session = self.session.as_mut().ok_or(EngineError::NotActive)?;
        session.writer.flush()?;
        Ok(())
    }

    /// End the session: final flush, then drop all session state.
    /// Does nothing when no session is active.
    pub fn deinit(&mut self) {
        let Some(Session { whitelist, writer, .. }) = self.session.take() else {
            self.sink.report(Diagnostic::NotActive { operation: "deinit" });
            return;
        };

        let manifest = writer.path().to_path_buf();
        if let Err(error) = writer.close() {
            self.sink.report(Diagnostic::Manifest(error));
        }
        self.sink.report(Diagnostic::SessionEnded {
            entries: whitelist.len(),
            manifest,
        });
    }
}

/// Copy as much of `url` as fits, backing off to a char boundary.
fn copy_truncated(url: &str, out: &mut [u8]) -> UrlCopy {
    let mut end = url.len().min(out.len());
    while !url.is_char_boundary(end) {
        end -= 1;
    }
    out[..end].copy_from_slice(&url.as_bytes()[..end]);
    UrlCopy {
        written: end,
        full: url.len(),
    }
}

fn rejection(raw_path: &str) -> Option<&'static str> {
    if raw_path.trim().is_empty() {
        return Some("empty path");
    }
    if raw_path.chars().any(char::is_control) {
        return Some("control character in path");
    }
    // `*N` names a brush model inside the map, not a file.
    if let Some(index) = raw_path.strip_prefix('*') {
        if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) {
            return Some("brush model reference");
        }
    }
    None
}
