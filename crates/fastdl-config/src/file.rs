use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fastdl_manifest::{FlushPolicy, ManifestFormat};
use fastdl_whitelist::{CaseFolding, PathNormalizer, RuleParseError, RuleSet, RuleSpec};
use serde::de::DeserializeOwned;

use crate::entries;
use crate::error::{ConfigError, ConfigWarning, Result};
use crate::session::{SessionConfig, default_url};
use crate::url::resolve_url;
use crate::{CONFIG_FILE_NAME, DEFAULT_MANIFEST_NAME};

/// A usable configuration plus everything that had to be worked around.
#[derive(Debug)]
pub struct Loaded {
    pub config: SessionConfig,
    pub warnings: Vec<ConfigWarning>,
}

/// Read `<config_dir>/fastdl.toml`.
///
/// A missing file is not an error: defaults are returned with a
/// [`ConfigWarning::MissingFile`]. An unreadable one is.
pub fn load(config_dir: &Path, game_dir: &Path) -> Result<Loaded> {
    let path = config_dir.join(CONFIG_FILE_NAME);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Ok(Loaded {
                config: SessionConfig::defaults(config_dir, game_dir),
                warnings: vec![ConfigWarning::MissingFile { path }],
            });
        }
        Err(source) => return Err(ConfigError::Read { path, source }),
    };
    Ok(parse(&text, &path, config_dir, game_dir))
}

/// [`load`], with any [`ConfigError`] turned into defaults and a warning.
pub fn load_or_default(config_dir: &Path, game_dir: &Path) -> Loaded {
    load(config_dir, game_dir).unwrap_or_else(|err| Loaded {
        config: SessionConfig::defaults(config_dir, game_dir),
        warnings: vec![ConfigWarning::Fallback(err)],
    })
}

/// Build a session config from file text. `source` only labels log events.
///
/// Never fails. Unreadable lines, bad values and bad rules are each
/// reported and skipped; everything else still applies.
pub fn parse(text: &str, source: &Path, config_dir: &Path, game_dir: &Path) -> Loaded {
    let (entries, mut warnings) = entries::read(text);

    let mut url_template: Option<String> = None;
    let mut folding = CaseFolding::platform();
    let mut manifest_path = config_dir.join(DEFAULT_MANIFEST_NAME);
    let mut manifest_format = ManifestFormat::default();
    let mut flush_policy = FlushPolicy::default();
    let mut rule_list: Option<Vec<toml::Value>> = None;
    let mut single_rules: Vec<toml::Value> = Vec::new();

    for (key, value) in entries {
        match key.as_str() {
            "download_url" => {
                if let Some(url) = take::<String>(&key, value, &mut warnings) {
                    url_template = Some(url);
                }
            }
            "case_folding" => {
                if let Some(raw) = take::<String>(&key, value, &mut warnings) {
                    match parse_folding(&raw) {
                        Some(parsed) => folding = parsed,
                        None => warnings.push(ConfigWarning::InvalidValue {
                            key,
                            reason: format!(
                                "'{raw}' is not 'platform', 'sensitive' or 'insensitive'"
                            ),
                        }),
                    }
                }
            }
            "manifest" => {
                if let Some(path) = take::<PathBuf>(&key, value, &mut warnings) {
                    manifest_path = config_dir.join(path);
                }
            }
            "manifest_format" => {
                if let Some(format) = take::<ManifestFormat>(&key, value, &mut warnings) {
                    manifest_format = format;
                }
            }
            "flush_every" => match take::<usize>(&key, value, &mut warnings) {
                Some(0) => warnings.push(ConfigWarning::InvalidValue {
                    key,
                    reason: "must be at least 1".to_string(),
                }),
                Some(count) => flush_policy = flush_policy.max_pending(count),
                None => {}
            },
            "flush_interval_ms" => {
                if let Some(ms) = take::<u64>(&key, value, &mut warnings) {
                    flush_policy = flush_policy.max_age(Duration::from_millis(ms));
                }
            }
            "rules" => rule_list = take(&key, value, &mut warnings),
            // One rule per line; appended after `rules`, in file order.
            "rule" => single_rules.push(value),
            _ => warnings.push(ConfigWarning::UnknownKey(key)),
        }
    }

    let normalizer = PathNormalizer::new(folding);
    let rules = if rule_list.is_none() && single_rules.is_empty() {
        RuleSet::allow_all()
    } else {
        let values = rule_list.into_iter().flatten().chain(single_rules);
        compile_rules(values, &normalizer, &mut warnings)
    };

    let download_url = match resolve_url(url_template.as_deref().unwrap_or_default(), game_dir) {
        Ok(url) => url,
        Err(error) => {
            let fallback = default_url(game_dir);
            warnings.push(ConfigWarning::UrlRejected {
                error,
                fallback: fallback.clone(),
            });
            fallback
        }
    };

    tracing::debug!(
        path = %source.display(),
        rules = rules.len(),
        warnings = warnings.len(),
        "fastdl config parsed"
    );

    Loaded {
        config: SessionConfig {
            download_url,
            rules,
            normalizer,
            manifest_path,
            manifest_format,
            flush_policy,
        },
        warnings,
    }
}

fn take<T: DeserializeOwned>(
    key: &str,
    value: toml::Value,
    warnings: &mut Vec<ConfigWarning>,
) -> Option<T> {
    match value.try_into() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warnings.push(ConfigWarning::InvalidValue {
                key: key.to_string(),
                reason: e.to_string(),
            });
            None
        }
    }
}

fn parse_folding(raw: &str) -> Option<CaseFolding> {
    match raw.to_ascii_lowercase().as_str() {
        "platform" | "auto" => Some(CaseFolding::platform()),
        "sensitive" => Some(CaseFolding::Sensitive),
        "insensitive" => Some(CaseFolding::Insensitive),
        _ => None,
    }
}

fn rule_spec(value: toml::Value) -> (String, std::result::Result<RuleSpec, RuleParseError>) {
    match value {
        toml::Value::String(text) => {
            let spec = text.parse();
            (text, spec)
        }
        table @ toml::Value::Table(_) => {
            let text = table.to_string();
            let spec = table
                .try_into::<RuleSpec>()
                .map_err(|e| RuleParseError::Table(e.message().to_string()));
            (text, spec)
        }
        other => (
            other.to_string(),
            Err(RuleParseError::Table("expected a rule string or table".to_string())),
        ),
    }
}

fn compile_rules(
    values: impl IntoIterator<Item = toml::Value>,
    normalizer: &PathNormalizer,
    warnings: &mut Vec<ConfigWarning>,
) -> RuleSet {
    let mut rules = Vec::new();
    for (index, (text, spec)) in values.into_iter().map(rule_spec).enumerate() {
        match spec.and_then(|spec| spec.compile(normalizer)) {
            Ok(rule) => rules.push(rule),
            Err(reason) => warnings.push(ConfigWarning::RuleSkipped {
                index: index + 1,
                text,
                reason,
            }),
        }
    }

    if rules.is_empty() {
        warnings.push(ConfigWarning::NoRules);
    }
    RuleSet::new(rules)
}
