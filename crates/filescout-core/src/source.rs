//! Catalog sources.
//!
//! The set of catalogs is fixed at compile time; configuration only decides
//! which of them are searched and in what precedence order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the backing file catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Main catalog.
    Primary,
    /// Cloud mirror catalog.
    Cloud,
    /// Long-term archive catalog.
    Archive,
}

/// Returned when a source name is not one of the known catalogs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown source: {0}")]
pub struct UnknownSource(pub String);

impl Source {
    /// Every known source in default precedence order.
    pub const ALL: [Self; 3] = [Self::Primary, Self::Cloud, Self::Archive];

    /// Wire name used in callback tokens and configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Cloud => "cloud",
            Self::Archive => "archive",
        }
    }

    /// Capitalized name for button labels.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Primary => "Primary",
            Self::Cloud => "Cloud",
            Self::Archive => "Archive",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = UnknownSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(Self::Primary),
            "cloud" => Ok(Self::Cloud),
            "archive" => Ok(Self::Archive),
            other => Err(UnknownSource(other.to_string())),
        }
    }
}

/// Which catalogs a search should consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSelector {
    /// Search every configured catalog in precedence order.
    All,
    /// Prefer one catalog, falling back to precedence order when it is empty.
    Only(Source),
}

impl SourceSelector {
    /// Ordered list of sources to try for this selector.
    #[must_use]
    pub fn candidates(self, precedence: &[Source]) -> Vec<Source> {
        match self {
            Self::All => precedence.to_vec(),
            Self::Only(preferred) => std::iter::once(preferred)
                .chain(precedence.iter().copied().filter(|s| *s != preferred))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_names_round_trip() {
        for source in Source::ALL {
            assert_eq!(source.as_str().parse::<Source>(), Ok(source));
        }
        assert_eq!(
            "Primary".parse::<Source>(),
            Err(UnknownSource("Primary".to_string()))
        );
    }

    #[test]
    fn test_candidates_all_follows_precedence() {
        let precedence = [Source::Cloud, Source::Primary];
        assert_eq!(
            SourceSelector::All.candidates(&precedence),
            vec![Source::Cloud, Source::Primary]
        );
    }

    #[test]
    fn test_candidates_only_puts_preferred_first() {
        let candidates = SourceSelector::Only(Source::Archive).candidates(&Source::ALL);
        assert_eq!(
            candidates,
            vec![Source::Archive, Source::Primary, Source::Cloud]
        );
    }
}
