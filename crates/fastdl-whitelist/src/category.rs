use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::RuleParseError;

/// Kind of precached resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceCategory {
    Model,
    Sound,
    Generic,
}

const MODEL_EXTENSIONS: [&str; 2] = ["mdl", "spr"];

impl ResourceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Sound => "sound",
            Self::Generic => "generic",
        }
    }

    /// Directory the engine resolves this category's paths against.
    ///
    /// Sound precaches name files relative to `sound/`; everything else is
    /// already relative to the game directory.
    pub fn root(&self) -> Option<&'static str> {
        match self {
            Self::Sound => Some("sound"),
            Self::Model | Self::Generic => None,
        }
    }

    /// Category forced by a precache hook hint, if the hint names one.
    pub fn from_hint(hint: &str) -> Option<Self> {
        let hint = hint.trim();
        if hint.is_empty() {
            return None;
        }
        hint.parse().ok()
    }

    /// `.mdl` and `.spr` are models, anything else is a generic file.
    pub fn infer_from_path(raw_path: &str) -> Self {
        let file = raw_path.rsplit(['/', '\\']).next().unwrap_or(raw_path);
        let extension = file.rsplit_once('.').map(|(_, ext)| ext);
        match extension {
            Some(ext) if MODEL_EXTENSIONS.iter().any(|m| ext.eq_ignore_ascii_case(m)) => {
                Self::Model
            }
            _ => Self::Generic,
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceCategory {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "model" | "models" => Ok(Self::Model),
            "sound" | "sounds" => Ok(Self::Sound),
            "generic" => Ok(Self::Generic),
            _ => Err(RuleParseError::UnknownCategory(s.to_string())),
        }
    }
}
