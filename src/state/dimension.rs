use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifies one of the categorical filters exposed by the search screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterDimension {
    Project,
    Version,
    Extension,
    Language,
    Repository,
}

impl FilterDimension {
    /// Stable identifier used both as URL key and backend parameter name.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            FilterDimension::Project => "project",
            FilterDimension::Version => "version",
            FilterDimension::Extension => "extension",
            FilterDimension::Language => "language",
            FilterDimension::Repository => "repository",
        }
    }

    /// All dimensions in their canonical encoding order.
    #[must_use]
    pub const fn all() -> [FilterDimension; 5] {
        [
            FilterDimension::Project,
            FilterDimension::Version,
            FilterDimension::Extension,
            FilterDimension::Language,
            FilterDimension::Repository,
        ]
    }

    /// Resolve a dimension from its identifier.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::all().into_iter().find(|dimension| dimension.id() == id)
    }
}

impl fmt::Display for FilterDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for FilterDimension {
    type Err = UnknownDimension;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| UnknownDimension(s.to_string()))
    }
}

/// Returned when a string does not name a [`FilterDimension`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter dimension '{0}'")]
pub struct UnknownDimension(pub String);

/// Which flavour of matching the backend should apply to the query.
///
/// Fuzzy and regex matching are mutually exclusive, so the mode is a single
/// enum rather than a pair of flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Normal,
    Fuzzy,
    Regex,
}

impl SearchMode {
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            SearchMode::Normal => "normal",
            SearchMode::Fuzzy => "fuzzy",
            SearchMode::Regex => "regex",
        }
    }

    #[must_use]
    pub const fn is_fuzzy(self) -> bool {
        matches!(self, SearchMode::Fuzzy)
    }

    #[must_use]
    pub const fn is_regex(self) -> bool {
        matches!(self, SearchMode::Regex)
    }

    /// Collapse a pair of independent flags into a mode. Regex wins when both
    /// are set.
    #[must_use]
    pub const fn from_flags(fuzzy: bool, regex: bool) -> Self {
        if regex {
            SearchMode::Regex
        } else if fuzzy {
            SearchMode::Fuzzy
        } else {
            SearchMode::Normal
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
