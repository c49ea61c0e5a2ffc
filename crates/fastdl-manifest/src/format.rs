use std::fmt;
use std::str::FromStr;

use fastdl_whitelist::WhitelistEntry;
use serde::Deserialize;

/// Line layout of the published manifest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestFormat {
    /// One path per line; a path accepted under two categories is listed once.
    /// Directly usable as an `rsync --files-from` list.
    #[default]
    Plain,
    /// `<category>\t<path>` per whitelist entry.
    Tagged,
}

impl ManifestFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Tagged => "tagged",
        }
    }

    pub(crate) fn write_line(&self, entry: &WhitelistEntry, out: &mut String) {
        if *self == Self::Tagged {
            out.push_str(entry.category.as_str());
            out.push('\t');
        }
        out.push_str(entry.path.as_str());
        out.push('\n');
    }
}

impl fmt::Display for ManifestFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ManifestFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "tagged" => Ok(Self::Tagged),
            other => Err(format!(
                "unknown manifest format '{other}', expected 'plain' or 'tagged'"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastdl_whitelist::{CaseFolding, PathNormalizer, ResourceCategory};

    #[test]
    fn test_line_layouts() {
        let n = PathNormalizer::new(CaseFolding::Sensitive);
        let path = n.normalize("ambience/wind.wav", ResourceCategory::Sound);
        let entry = WhitelistEntry::new(ResourceCategory::Sound, path);

        let mut plain = String::new();
        ManifestFormat::Plain.write_line(&entry, &mut plain);
        assert_eq!(plain, "sound/ambience/wind.wav\n");

        let mut tagged = String::new();
        ManifestFormat::Tagged.write_line(&entry, &mut tagged);
        assert_eq!(tagged, "sound\tsound/ambience/wind.wav\n");
    }

    #[test]
    fn test_parse() {
        assert_eq!("Tagged".parse::<ManifestFormat>(), Ok(ManifestFormat::Tagged));
        assert!("json".parse::<ManifestFormat>().is_err());
    }
}
