use std::borrow::Cow;
use std::fmt;

use crate::category::ResourceCategory;

const SEPARATORS: [char; 2] = ['/', '\\'];

/// How resource paths are case-folded for comparison.
///
/// Fixed for a whole session; a path key never mixes policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CaseFolding {
    /// Keys keep their original case.
    Sensitive,
    /// Keys are ASCII-lowercased.
    Insensitive,
}

impl CaseFolding {
    /// Policy matching the host filesystem's usual behaviour.
    pub const fn platform() -> Self {
        if cfg!(any(target_os = "windows", target_os = "macos")) {
            Self::Insensitive
        } else {
            Self::Sensitive
        }
    }

    fn fold<'a>(&self, raw: &'a str) -> Cow<'a, str> {
        match self {
            Self::Insensitive if raw.bytes().any(|b| b.is_ascii_uppercase()) => {
                Cow::Owned(raw.to_ascii_lowercase())
            }
            _ => Cow::Borrowed(raw),
        }
    }
}

impl Default for CaseFolding {
    fn default() -> Self {
        Self::platform()
    }
}

/// A resource path reduced to its comparison key.
///
/// `/`-separated, no empty segments, folded by the session's [`CaseFolding`].
/// The empty key stands for "no path" and is never whitelisted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath(String);

impl NormalizedPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `prefix` equals this path or names one of its ancestor
    /// directories. Partial segments never match.
    pub fn starts_with_segments(&self, prefix: &NormalizedPath) -> bool {
        match self.0.strip_prefix(prefix.as_str()) {
            Some(rest) => rest.is_empty() || prefix.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

impl AsRef<str> for NormalizedPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Turns raw precache strings into [`NormalizedPath`] keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PathNormalizer {
    folding: CaseFolding,
}

impl PathNormalizer {
    pub fn new(folding: CaseFolding) -> Self {
        Self { folding }
    }

    pub fn folding(&self) -> CaseFolding {
        self.folding
    }

    /// Normalize a precached path of the given category.
    ///
    /// Total over all inputs. Sound paths are rooted under `sound/` unless
    /// already rooted there, so normalizing a normalized key is a no-op.
    pub fn normalize(&self, raw: &str, category: ResourceCategory) -> NormalizedPath {
        self.normalize_rooted(raw, category.root())
    }

    /// Normalize a rule pattern. Patterns are never re-rooted.
    pub fn normalize_pattern(&self, raw: &str) -> NormalizedPath {
        self.normalize_rooted(raw, None)
    }

    fn normalize_rooted(&self, raw: &str, root: Option<&str>) -> NormalizedPath {
        let folded = self.folding.fold(raw);
        let mut segments = folded.split(SEPARATORS).filter(|s| !s.is_empty()).peekable();

        let Some(first) = segments.peek() else {
            return NormalizedPath::default();
        };

        let mut out = String::with_capacity(folded.len() + root.map_or(0, |r| r.len() + 1));
        if let Some(root) = root {
            let rooted = match self.folding {
                CaseFolding::Sensitive => *first == root,
                CaseFolding::Insensitive => first.eq_ignore_ascii_case(root),
            };
            if !rooted {
                out.push_str(&self.folding.fold(root));
            }
        }

        for segment in segments {
            if !out.is_empty() {
                out.push('/');
            }
            out.push_str(segment);
        }

        NormalizedPath(out)
    }
}
