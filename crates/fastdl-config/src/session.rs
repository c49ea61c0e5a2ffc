use std::path::{Path, PathBuf};

use fastdl_manifest::{FlushPolicy, ManifestFormat};
use fastdl_whitelist::{PathNormalizer, RuleSet};

use crate::url::resolve_url;
use crate::{DEFAULT_DOWNLOAD_URL, DEFAULT_MANIFEST_NAME};

/// Everything one session needs, fixed at `init`.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub(crate) download_url: String,
    pub(crate) rules: RuleSet,
    pub(crate) normalizer: PathNormalizer,
    pub(crate) manifest_path: PathBuf,
    pub(crate) manifest_format: ManifestFormat,
    pub(crate) flush_policy: FlushPolicy,
}

impl SessionConfig {
    /// Default URL, allow-all rules, platform case folding, manifest in
    /// `config_dir`.
    pub fn defaults(config_dir: &Path, game_dir: &Path) -> Self {
        Self {
            download_url: default_url(game_dir),
            rules: RuleSet::allow_all(),
            normalizer: PathNormalizer::default(),
            manifest_path: config_dir.join(DEFAULT_MANIFEST_NAME),
            manifest_format: ManifestFormat::default(),
            flush_policy: FlushPolicy::default(),
        }
    }

    /// Resolved download URL, `%game%` already expanded.
    pub fn download_url(&self) -> &str {
        &self.download_url
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn normalizer(&self) -> &PathNormalizer {
        &self.normalizer
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn manifest_format(&self) -> ManifestFormat {
        self.manifest_format
    }

    pub fn flush_policy(&self) -> FlushPolicy {
        self.flush_policy
    }

    /// Replace the manifest location, e.g. to keep tests inside a temp dir.
    pub fn with_manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = path.into();
        self
    }
}

pub(crate) fn default_url(game_dir: &Path) -> String {
    resolve_url(DEFAULT_DOWNLOAD_URL, game_dir).unwrap_or_else(|_| "http://localhost/".to_string())
}
