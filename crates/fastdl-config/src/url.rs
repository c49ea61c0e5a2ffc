use std::path::Path;

use url::Url;

use crate::error::{ConfigError, Result};

const GAME_TOKENS: [&str; 2] = ["%gamedir%", "%game%"];

/// Final segment of the game directory (`/srv/hlds/cstrike` -> `cstrike`).
pub fn game_name(game_dir: &Path) -> String {
    let raw = game_dir.to_string_lossy();
    raw.split(['/', '\\'])
        .filter(|segment| !segment.is_empty())
        .last()
        .unwrap_or_default()
        .to_string()
}

/// Expand `%game%` and check the result is an absolute http(s) URL.
///
/// The expanded text is returned as written; it is not re-serialized.
pub fn resolve_url(template: &str, game_dir: &Path) -> Result<String> {
    let template = template.trim();
    if template.is_empty() {
        return Err(ConfigError::EmptyUrl);
    }

    let game = game_name(game_dir);
    let url = GAME_TOKENS
        .iter()
        .fold(template.to_string(), |url, token| url.replace(token, &game));

    let parsed = Url::parse(&url).map_err(|e| ConfigError::InvalidUrl {
        url: url.clone(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            reason: format!("scheme '{}' is not http or https", parsed.scheme()),
            url,
        });
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::InvalidUrl {
            url,
            reason: "missing host".to_string(),
        });
    }

    Ok(url)
}
