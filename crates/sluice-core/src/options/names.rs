//! Named access to typed options, for configuration files and the CLI.

use super::value::MergePolicy;
use crate::SluiceError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar as it arrives from configuration: TOML/JSON keep the type,
/// command lines deliver text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Bool(b) => write!(f, "{}", b),
            ScalarValue::Int(i) => write!(f, "{}", i),
            ScalarValue::Text(s) => f.write_str(s),
        }
    }
}

/// Value type carried by an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    Bool,
    Int,
    Text,
    Level,
}

/// Every option settable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionName {
    RewriteLevel,
    CssInlineMaxBytes,
    ImageInlineMaxBytes,
    JsInlineMaxBytes,
    CssOutlineMinBytes,
    JsOutlineMinBytes,
    HtmlCacheTimeMs,
    BeaconUrl,
    ImageMaxRewritesAtOnce,
    MaxUrlSegmentSize,
    MaxUrlSize,
    Enabled,
    BotdetectEnabled,
    CombineAcrossPaths,
    LogRewriteTiming,
    LowercaseHtmlNames,
    AlwaysRewriteCss,
    RespectVary,
    FinderPropertiesCacheExpirationTimeMs,
    CacheInvalidationTimestamp,
}

impl OptionName {
    pub const ALL: [OptionName; 20] = [
        OptionName::RewriteLevel,
        OptionName::CssInlineMaxBytes,
        OptionName::ImageInlineMaxBytes,
        OptionName::JsInlineMaxBytes,
        OptionName::CssOutlineMinBytes,
        OptionName::JsOutlineMinBytes,
        OptionName::HtmlCacheTimeMs,
        OptionName::BeaconUrl,
        OptionName::ImageMaxRewritesAtOnce,
        OptionName::MaxUrlSegmentSize,
        OptionName::MaxUrlSize,
        OptionName::Enabled,
        OptionName::BotdetectEnabled,
        OptionName::CombineAcrossPaths,
        OptionName::LogRewriteTiming,
        OptionName::LowercaseHtmlNames,
        OptionName::AlwaysRewriteCss,
        OptionName::RespectVary,
        OptionName::FinderPropertiesCacheExpirationTimeMs,
        OptionName::CacheInvalidationTimestamp,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            OptionName::RewriteLevel => "rewrite_level",
            OptionName::CssInlineMaxBytes => "css_inline_max_bytes",
            OptionName::ImageInlineMaxBytes => "image_inline_max_bytes",
            OptionName::JsInlineMaxBytes => "js_inline_max_bytes",
            OptionName::CssOutlineMinBytes => "css_outline_min_bytes",
            OptionName::JsOutlineMinBytes => "js_outline_min_bytes",
            OptionName::HtmlCacheTimeMs => "html_cache_time_ms",
            OptionName::BeaconUrl => "beacon_url",
            OptionName::ImageMaxRewritesAtOnce => "image_max_rewrites_at_once",
            OptionName::MaxUrlSegmentSize => "max_url_segment_size",
            OptionName::MaxUrlSize => "max_url_size",
            OptionName::Enabled => "enabled",
            OptionName::BotdetectEnabled => "botdetect_enabled",
            OptionName::CombineAcrossPaths => "combine_across_paths",
            OptionName::LogRewriteTiming => "log_rewrite_timing",
            OptionName::LowercaseHtmlNames => "lowercase_html_names",
            OptionName::AlwaysRewriteCss => "always_rewrite_css",
            OptionName::RespectVary => "respect_vary",
            OptionName::FinderPropertiesCacheExpirationTimeMs => {
                "finder_properties_cache_expiration_time_ms"
            }
            OptionName::CacheInvalidationTimestamp => "cache_invalidation_timestamp",
        }
    }

    /// Look up an option by its snake_case name.
    pub fn from_name(name: &str) -> Result<OptionName, SluiceError> {
        OptionName::ALL
            .into_iter()
            .find(|option| option.as_str() == name)
            .ok_or_else(|| SluiceError::UnknownOption(name.to_string()))
    }

    #[must_use]
    pub const fn option_type(self) -> OptionType {
        match self {
            OptionName::RewriteLevel => OptionType::Level,
            OptionName::BeaconUrl => OptionType::Text,
            OptionName::Enabled
            | OptionName::BotdetectEnabled
            | OptionName::CombineAcrossPaths
            | OptionName::LogRewriteTiming
            | OptionName::LowercaseHtmlNames
            | OptionName::AlwaysRewriteCss
            | OptionName::RespectVary => OptionType::Bool,
            _ => OptionType::Int,
        }
    }

    #[must_use]
    pub const fn policy(self) -> MergePolicy {
        match self {
            OptionName::CacheInvalidationTimestamp => MergePolicy::MonotonicMax,
            _ => MergePolicy::Override,
        }
    }

    /// Interpret command-line text according to this option's type.
    pub fn parse_value(self, text: &str) -> Result<ScalarValue, SluiceError> {
        let text = text.trim();
        let invalid = || SluiceError::InvalidOptionValue {
            name: self.as_str().to_string(),
            value: text.to_string(),
        };
        match self.option_type() {
            OptionType::Bool => match text.to_ascii_lowercase().as_str() {
                "true" | "on" | "yes" | "1" => Ok(ScalarValue::Bool(true)),
                "false" | "off" | "no" | "0" => Ok(ScalarValue::Bool(false)),
                _ => Err(invalid()),
            },
            OptionType::Int => text.parse().map(ScalarValue::Int).map_err(|_| invalid()),
            OptionType::Text | OptionType::Level => Ok(ScalarValue::Text(text.to_string())),
        }
    }
}

impl fmt::Display for OptionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
