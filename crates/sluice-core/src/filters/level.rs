//! Rewrite levels: named presets bundling a default filter set.

use crate::SluiceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named preset of default-enabled filters.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum RewriteLevel {
    /// Nothing is enabled by default.
    #[default]
    PassThrough,
    /// Filters considered safe for most sites.
    CoreFilters,
    /// Core filters plus ones still being qualified.
    TestingCoreFilters,
    /// Every filter in the catalog.
    AllFilters,
}

impl RewriteLevel {
    pub const ALL: [RewriteLevel; 4] = [
        RewriteLevel::PassThrough,
        RewriteLevel::CoreFilters,
        RewriteLevel::TestingCoreFilters,
        RewriteLevel::AllFilters,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            RewriteLevel::PassThrough => "PassThrough",
            RewriteLevel::CoreFilters => "CoreFilters",
            RewriteLevel::TestingCoreFilters => "TestingCoreFilters",
            RewriteLevel::AllFilters => "AllFilters",
        }
    }

    /// Case-insensitive parse of a level name.
    #[must_use]
    pub fn parse(text: &str) -> Option<RewriteLevel> {
        let text = text.trim();
        RewriteLevel::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(text))
    }
}

impl fmt::Display for RewriteLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RewriteLevel {
    type Err = SluiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RewriteLevel::parse(s).ok_or_else(|| SluiceError::InvalidRewriteLevel(s.to_string()))
    }
}
