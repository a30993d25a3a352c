//! # Filter Catalog
//!
//! Process-wide, read-only tables:
//! - filter name -> filter (canonical names plus deprecated spellings)
//! - group name -> filter set (compound names such as `rewrite_images`)
//! - rewrite level -> default filter set
//!
//! The tables are built exactly once, on first access, and never mutated
//! afterwards. Every thread shares the same `&'static FilterCatalog`.

use super::{Filter, FilterSet, RewriteLevel};
use std::collections::BTreeMap;
use std::sync::OnceLock;

static CATALOG: OnceLock<FilterCatalog> = OnceLock::new();

/// Deprecated spellings that still resolve.
const FILTER_ALIASES: &[(&str, Filter)] = &[
    ("insert_img_dimensions", Filter::InsertImageDimensions),
    ("left_trim_urls", Filter::LeftTrimUrls),
];

/// Members of the `rewrite_images` group.
const REWRITE_IMAGES_GROUP: &[Filter] = &[
    Filter::InlineImages,
    Filter::InsertImageDimensions,
    Filter::RecompressImages,
    Filter::ResizeImages,
];

const CORE_FILTERS: &[Filter] = &[
    Filter::AddHead,
    Filter::CombineCss,
    Filter::ExtendCache,
    Filter::InlineCss,
    Filter::InlineImages,
    Filter::InlineJavascript,
    Filter::InsertImageDimensions,
    Filter::LeftTrimUrls,
    Filter::RecompressImages,
    Filter::ResizeImages,
    Filter::RewriteCss,
    Filter::RewriteJavascript,
];

/// Added on top of `CORE_FILTERS` for `TestingCoreFilters`.
const TESTING_ONLY_FILTERS: &[Filter] = &[
    Filter::ConvertJpegToWebp,
    Filter::FlushHtml,
    Filter::MakeGoogleAnalyticsAsync,
    Filter::RewriteDomains,
];

/// Immutable lookup tables for filter names, groups and level defaults.
#[derive(Debug)]
pub struct FilterCatalog {
    name_to_filter: BTreeMap<&'static str, Filter>,
    name_to_group: BTreeMap<&'static str, FilterSet>,
    pass_through: FilterSet,
    core: FilterSet,
    testing_core: FilterSet,
    all: FilterSet,
}

impl FilterCatalog {
    /// The process-wide catalog, built on first use.
    pub fn global() -> &'static FilterCatalog {
        CATALOG.get_or_init(FilterCatalog::build)
    }

    fn build() -> Self {
        let mut name_to_filter: BTreeMap<&'static str, Filter> =
            Filter::ALL.iter().map(|f| (f.name(), *f)).collect();
        for (alias, filter) in FILTER_ALIASES {
            name_to_filter.insert(*alias, *filter);
        }

        let mut name_to_group = BTreeMap::new();
        name_to_group.insert(
            "rewrite_images",
            REWRITE_IMAGES_GROUP.iter().copied().collect::<FilterSet>(),
        );

        let core: FilterSet = CORE_FILTERS.iter().copied().collect();
        let mut testing_core = core.clone();
        testing_core.extend(TESTING_ONLY_FILTERS.iter().copied());

        Self {
            name_to_filter,
            name_to_group,
            pass_through: FilterSet::new(),
            core,
            testing_core,
            all: Filter::ALL.iter().copied().collect(),
        }
    }

    /// Resolve a single filter name (canonical or deprecated spelling).
    #[must_use]
    pub fn lookup_filter(&self, name: &str) -> Option<Filter> {
        self.name_to_filter.get(name).copied()
    }

    /// Resolve a compound group name.
    #[must_use]
    pub fn lookup_group(&self, name: &str) -> Option<&FilterSet> {
        self.name_to_group.get(name)
    }

    /// Default filter set for `level`.
    #[must_use]
    pub fn level_defaults(&self, level: RewriteLevel) -> &FilterSet {
        match level {
            RewriteLevel::PassThrough => &self.pass_through,
            RewriteLevel::CoreFilters => &self.core,
            RewriteLevel::TestingCoreFilters => &self.testing_core,
            RewriteLevel::AllFilters => &self.all,
        }
    }

    /// Every accepted filter name, including deprecated ones.
    pub fn filter_names(&self) -> impl Iterator<Item = (&'static str, Filter)> + '_ {
        self.name_to_filter.iter().map(|(name, filter)| (*name, *filter))
    }

    /// Every group name with its members.
    pub fn groups(&self) -> impl Iterator<Item = (&'static str, &FilterSet)> + '_ {
        self.name_to_group.iter().map(|(name, set)| (*name, set))
    }
}
