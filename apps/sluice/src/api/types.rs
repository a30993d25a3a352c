//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use sluice_core::primitives::MAX_URL_SIZE;
use sluice_core::{
    CacheStatus, CriticalContext, Filter, FilterCatalog, FilterSet, MergePolicy, OptionName,
    RewriteLevel, RewriteOptions, ScopeConfig, SluiceError,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Maximum number of URLs in one critical set (per context).
pub const MAX_CRITICAL_SET_LEN: usize = 4096;

fn validate_url(url: &str) -> Result<(), SluiceError> {
    if url.is_empty() {
        return Err(SluiceError::ConfigError("url must not be empty".to_string()));
    }
    if url.len() > MAX_URL_SIZE as usize {
        return Err(SluiceError::ConfigError(format!(
            "url length {} exceeds maximum {} bytes",
            url.len(),
            MAX_URL_SIZE
        )));
    }
    Ok(())
}

fn filter_names(set: &FilterSet) -> Vec<String> {
    set.iter().map(|f| f.name().to_string()).collect()
}

fn critical_set(
    context: CriticalContext,
    list: Option<&Vec<String>>,
) -> Result<Option<BTreeSet<String>>, SluiceError> {
    match list {
        Some(list) if list.len() > MAX_CRITICAL_SET_LEN => Err(SluiceError::ConfigError(format!(
            "{} set has {} entries, maximum is {}",
            context,
            list.len(),
            MAX_CRITICAL_SET_LEN
        ))),
        Some(list) => Ok(Some(list.iter().cloned().collect())),
        None => Ok(None),
    }
}

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// FILTERS RESPONSE
// =============================================================================

/// The filter catalog: canonical names, groups and level defaults, plus
/// how each named option merges across scopes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiltersResponse {
    pub filters: Vec<String>,
    pub groups: BTreeMap<String, Vec<String>>,
    pub levels: BTreeMap<String, Vec<String>>,
    pub options: BTreeMap<String, MergePolicy>,
}

impl FiltersResponse {
    pub fn from_catalog(catalog: &FilterCatalog) -> Self {
        Self {
            filters: Filter::ALL
                .iter()
                .map(|f| f.name().to_string())
                .collect(),
            groups: catalog
                .groups()
                .map(|(name, set)| (name.to_string(), filter_names(set)))
                .collect(),
            levels: RewriteLevel::ALL
                .iter()
                .map(|level| (level.name().to_string(), filter_names(catalog.level_defaults(*level))))
                .collect(),
            options: OptionName::ALL
                .iter()
                .map(|name| (name.as_str().to_string(), name.policy()))
                .collect(),
        }
    }
}

// =============================================================================
// RESOLVE REQUEST/RESPONSE
// =============================================================================

/// Resolve the options for a host, optionally layering a request scope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveRequest {
    pub host: String,
    pub scope: Option<ScopeConfig>,
}

/// The resolved snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub success: bool,
    pub host: String,
    pub level: Option<String>,
    pub enabled_filters: Vec<String>,
    pub explicitly_enabled: Vec<String>,
    pub explicitly_disabled: Vec<String>,
    pub options: BTreeMap<String, String>,
    pub domains: Vec<String>,
    /// Source domain -> target domain.
    pub domain_rewrites: BTreeMap<String, String>,
    pub low_res_images_inplace: bool,
    pub warnings: Vec<String>,
    pub error: Option<String>,
}

impl ResolveResponse {
    pub fn success(host: impl Into<String>, options: &RewriteOptions, warnings: Vec<String>) -> Self {
        Self {
            success: true,
            host: host.into(),
            level: Some(options.level().name().to_string()),
            enabled_filters: filter_names(&options.resolved_filters()),
            explicitly_enabled: filter_names(options.explicitly_enabled()),
            explicitly_disabled: filter_names(options.explicitly_disabled()),
            options: OptionName::ALL
                .iter()
                .map(|name| (name.as_str().to_string(), options.option_value(*name).to_string()))
                .collect(),
            domains: options
                .domain_lawyer()
                .authorized_domains()
                .map(str::to_string)
                .collect(),
            domain_rewrites: options
                .domain_lawyer()
                .rewrite_mappings()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            low_res_images_inplace: options.insert_low_res_images_inplace(),
            warnings,
            error: None,
        }
    }

    pub fn error(host: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            success: false,
            host: host.into(),
            level: None,
            enabled_filters: Vec::new(),
            explicitly_enabled: Vec::new(),
            explicitly_disabled: Vec::new(),
            options: BTreeMap::new(),
            domains: Vec::new(),
            domain_rewrites: BTreeMap::new(),
            low_res_images_inplace: false,
            warnings: Vec::new(),
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// CRITICAL RESOURCES
// =============================================================================

/// Query parameters of `GET /critical`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalQuery {
    pub url: String,
    #[serde(default)]
    pub host: String,
}

impl CriticalQuery {
    pub fn validate(&self) -> Result<(), SluiceError> {
        validate_url(&self.url)
    }
}

/// The critical sets for one page, as a request would see them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalResponse {
    pub success: bool,
    pub url: String,
    pub status: Option<CacheStatus>,
    pub html: Vec<String>,
    pub css: Vec<String>,
    pub error: Option<String>,
}

impl CriticalResponse {
    pub fn success(
        url: impl Into<String>,
        status: CacheStatus,
        html: &BTreeSet<String>,
        css: &BTreeSet<String>,
    ) -> Self {
        Self {
            success: true,
            url: url.into(),
            status: Some(status),
            html: html.iter().cloned().collect(),
            css: css.iter().cloned().collect(),
            error: None,
        }
    }

    pub fn error(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            success: false,
            url: url.into(),
            status: None,
            html: Vec::new(),
            css: Vec::new(),
            error: Some(msg.into()),
        }
    }
}

/// Store newly computed critical sets. An omitted context keeps what is
/// stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalUpdateRequest {
    pub url: String,
    #[serde(default)]
    pub html: Option<Vec<String>>,
    #[serde(default)]
    pub css: Option<Vec<String>>,
}

impl CriticalUpdateRequest {
    /// Validate and convert to per-context sets.
    pub fn to_sets(&self) -> Result<[Option<BTreeSet<String>>; 2], SluiceError> {
        validate_url(&self.url)?;
        Ok([
            critical_set(CriticalContext::Html, self.html.as_ref())?,
            critical_set(CriticalContext::Css, self.css.as_ref())?,
        ])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalUpdateResponse {
    pub success: bool,
    pub url: String,
    pub error: Option<String>,
}

impl CriticalUpdateResponse {
    pub fn success(url: impl Into<String>) -> Self {
        Self {
            success: true,
            url: url.into(),
            error: None,
        }
    }

    pub fn error(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            success: false,
            url: url.into(),
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// STATS RESPONSE
// =============================================================================

/// Lookup counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub counters: BTreeMap<String, u64>,
}
