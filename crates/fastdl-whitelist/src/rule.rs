//! Ordered include/exclude rules.
//!
//! Rules are scanned in configuration order and the first rule whose
//! category and pattern both match decides. A path no rule matches is
//! excluded: this is a whitelist.
//!
//! Rule text: `<include|exclude> <model|sound|generic|*> <pattern>`, where
//! the pattern is `*` (everything), `dir` or `dir/*` (that directory, on
//! segment boundaries), or `=path` (exactly that path).

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::category::ResourceCategory;
use crate::error::RuleParseError;
use crate::path::{NormalizedPath, PathNormalizer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Include,
    Exclude,
}

impl FromStr for Polarity {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "include" | "allow" | "+" => Ok(Self::Include),
            "exclude" | "deny" | "-" => Ok(Self::Exclude),
            _ => Err(RuleParseError::UnknownPolarity(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CategoryFilter {
    Any,
    Only(ResourceCategory),
}

impl CategoryFilter {
    pub fn matches(&self, category: ResourceCategory) -> bool {
        match self {
            Self::Any => true,
            Self::Only(only) => *only == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "*" | "any" => Ok(Self::Any),
            other => other.parse().map(Self::Only),
        }
    }
}

impl<'de> Deserialize<'de> for CategoryFilter {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Only(category) => category.fmt(f),
        }
    }
}

/// A rule as written in configuration, before pattern normalization.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    #[serde(alias = "polarity")]
    pub action: Polarity,
    #[serde(default = "RuleSpec::any_category")]
    pub category: CategoryFilter,
    pub pattern: String,
    #[serde(default)]
    pub exact: bool,
}

impl RuleSpec {
    fn any_category() -> CategoryFilter {
        CategoryFilter::Any
    }

    pub fn include(category: CategoryFilter, pattern: impl Into<String>) -> Self {
        Self {
            action: Polarity::Include,
            category,
            pattern: pattern.into(),
            exact: false,
        }
    }

    pub fn exclude(category: CategoryFilter, pattern: impl Into<String>) -> Self {
        Self {
            action: Polarity::Exclude,
            category,
            pattern: pattern.into(),
            exact: false,
        }
    }

    /// `include * *`: every resource of every category.
    pub fn allow_all() -> Self {
        Self::include(CategoryFilter::Any, "*")
    }

    /// Normalize the pattern with the session's policy.
    pub fn compile(&self, normalizer: &PathNormalizer) -> Result<WhitelistRule, RuleParseError> {
        let raw = self.pattern.trim();
        let (raw, exact) = match raw.strip_prefix('=') {
            Some(rest) => (rest, true),
            None => (raw, self.exact),
        };

        let pattern = if !exact && raw == "*" {
            RulePattern::Any
        } else {
            let body = if exact { raw } else { raw.strip_suffix("/*").unwrap_or(raw) };
            if body.contains('*') {
                return Err(RuleParseError::UnsupportedWildcard(self.pattern.clone()));
            }
            let key = normalizer.normalize_pattern(body);
            if key.is_empty() {
                return Err(RuleParseError::EmptyPattern(self.pattern.clone()));
            }
            if exact { RulePattern::Exact(key) } else { RulePattern::Prefix(key) }
        };

        Ok(WhitelistRule {
            polarity: self.action,
            category: self.category,
            pattern,
        })
    }
}

impl FromStr for RuleSpec {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let action = words.next().ok_or(RuleParseError::Empty)?.parse()?;
        let category = words.next().ok_or(RuleParseError::MissingPattern)?.parse()?;
        let pattern = words.next().ok_or(RuleParseError::MissingPattern)?.to_string();
        if let Some(extra) = words.next() {
            return Err(RuleParseError::TrailingInput(extra.to_string()));
        }
        Ok(Self {
            action,
            category,
            pattern,
            exact: false,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RulePattern {
    Any,
    Prefix(NormalizedPath),
    Exact(NormalizedPath),
}

impl RulePattern {
    pub fn matches(&self, path: &NormalizedPath) -> bool {
        match self {
            Self::Any => true,
            Self::Prefix(prefix) => path.starts_with_segments(prefix),
            Self::Exact(exact) => path == exact,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WhitelistRule {
    pub polarity: Polarity,
    pub category: CategoryFilter,
    pub pattern: RulePattern,
}

impl WhitelistRule {
    pub fn matches(&self, category: ResourceCategory, path: &NormalizedPath) -> bool {
        self.category.matches(category) && self.pattern.matches(path)
    }
}

/// Outcome of evaluating a path against a [`RuleSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Matched { polarity: Polarity, rule: usize },
    Unmatched,
}

impl Verdict {
    pub fn is_included(&self) -> bool {
        matches!(
            self,
            Self::Matched {
                polarity: Polarity::Include,
                ..
            }
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<WhitelistRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<WhitelistRule>) -> Self {
        Self { rules }
    }

    pub fn allow_all() -> Self {
        Self::new(vec![WhitelistRule {
            polarity: Polarity::Include,
            category: CategoryFilter::Any,
            pattern: RulePattern::Any,
        }])
    }

    pub fn evaluate(&self, category: ResourceCategory, path: &NormalizedPath) -> Verdict {
        if path.is_empty() {
            return Verdict::Unmatched;
        }
        self.rules
            .iter()
            .position(|rule| rule.matches(category, path))
            .map_or(Verdict::Unmatched, |index| Verdict::Matched {
                polarity: self.rules[index].polarity,
                rule: index,
            })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WhitelistRule> {
        self.rules.iter()
    }
}

impl FromIterator<WhitelistRule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = WhitelistRule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::CaseFolding;

    fn normalizer() -> PathNormalizer {
        PathNormalizer::new(CaseFolding::Sensitive)
    }

    fn compile(rules: &[&str]) -> RuleSet {
        let n = normalizer();
        rules
            .iter()
            .map(|r| r.parse::<RuleSpec>().unwrap().compile(&n).unwrap())
            .collect()
    }

    #[test]
    fn test_first_match_wins() {
        let rules = compile(&["exclude sound sound/weapons", "include sound sound/*"]);
        let n = normalizer();

        let ak = n.normalize("weapons/ak47.wav", ResourceCategory::Sound);
        assert_eq!(
            rules.evaluate(ResourceCategory::Sound, &ak),
            Verdict::Matched {
                polarity: Polarity::Exclude,
                rule: 0,
            }
        );

        let wind = n.normalize("ambience/wind.wav", ResourceCategory::Sound);
        assert!(rules.evaluate(ResourceCategory::Sound, &wind).is_included());
    }

    #[test]
    fn test_no_match_is_excluded() {
        let rules = compile(&["include model models"]);
        let path = normalizer().normalize("gfx/sky.tga", ResourceCategory::Generic);
        assert_eq!(rules.evaluate(ResourceCategory::Generic, &path), Verdict::Unmatched);
        assert!(!rules.evaluate(ResourceCategory::Generic, &path).is_included());
    }

    #[test]
    fn test_category_filter() {
        let rules = compile(&["include model models"]);
        let path = normalizer().normalize("models/a.mdl", ResourceCategory::Generic);
        assert!(!rules.evaluate(ResourceCategory::Generic, &path).is_included());
        assert!(rules.evaluate(ResourceCategory::Model, &path).is_included());
    }

    #[test]
    fn test_prefix_respects_segment_boundaries() {
        let rules = compile(&["include * models/props"]);
        let n = normalizer();
        let inside = n.normalize("models/props/crate.mdl", ResourceCategory::Model);
        let sibling = n.normalize("models/propsx/thing.mdl", ResourceCategory::Model);
        assert!(rules.evaluate(ResourceCategory::Model, &inside).is_included());
        assert!(!rules.evaluate(ResourceCategory::Model, &sibling).is_included());
    }

    #[test]
    fn test_exact_pattern() {
        let rules = compile(&["include * =models/player.mdl"]);
        let n = normalizer();
        let hit = n.normalize("models/player.mdl", ResourceCategory::Model);
        let miss = n.normalize("models/player.mdl/extra", ResourceCategory::Model);
        assert!(rules.evaluate(ResourceCategory::Model, &hit).is_included());
        assert!(!rules.evaluate(ResourceCategory::Model, &miss).is_included());
    }

    #[test]
    fn test_allow_all_skips_empty_paths() {
        let rules = RuleSet::allow_all();
        let empty = NormalizedPath::default();
        assert!(!rules.evaluate(ResourceCategory::Generic, &empty).is_included());
        let path = normalizer().normalize("anything", ResourceCategory::Generic);
        assert!(rules.evaluate(ResourceCategory::Generic, &path).is_included());
    }

    #[test]
    fn test_rule_text_errors() {
        assert_eq!("".parse::<RuleSpec>(), Err(RuleParseError::Empty));
        assert_eq!(
            "permit * models".parse::<RuleSpec>(),
            Err(RuleParseError::UnknownPolarity("permit".into()))
        );
        assert_eq!(
            "include maps de_dust".parse::<RuleSpec>(),
            Err(RuleParseError::UnknownCategory("maps".into()))
        );
        assert_eq!("include *".parse::<RuleSpec>(), Err(RuleParseError::MissingPattern));
        assert_eq!(
            "include * models extra".parse::<RuleSpec>(),
            Err(RuleParseError::TrailingInput("extra".into()))
        );
    }

    #[test]
    fn test_pattern_compile_errors() {
        let n = normalizer();
        let glob = RuleSpec::include(CategoryFilter::Any, "models/*.mdl");
        assert!(matches!(glob.compile(&n), Err(RuleParseError::UnsupportedWildcard(_))));
        let empty = RuleSpec::include(CategoryFilter::Any, "//");
        assert!(matches!(empty.compile(&n), Err(RuleParseError::EmptyPattern(_))));
        let bare_exact = RuleSpec::include(CategoryFilter::Any, "=");
        assert!(matches!(bare_exact.compile(&n), Err(RuleParseError::EmptyPattern(_))));
    }

    #[test]
    fn test_patterns_fold_with_session() {
        let n = PathNormalizer::new(CaseFolding::Insensitive);
        let rule = RuleSpec::include(CategoryFilter::Any, "Models\\Props/").compile(&n).unwrap();
        let path = n.normalize("MODELS/props/Crate.mdl", ResourceCategory::Model);
        assert!(rule.matches(ResourceCategory::Model, &path));
    }
}
