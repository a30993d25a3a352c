//! # Rewrite Options
//!
//! A configuration snapshot for one scope (global, per-host, per-request):
//! rewrite level, explicit enable/disable sets, typed option slots and the
//! auxiliary sub-configurations.
//!
//! A snapshot is mutated while privately owned and treated as read-only once
//! shared (typically behind an `Arc`). Nothing here locks.
//!
//! ## Filter precedence
//!
//! `enabled(f)` answers, in order:
//! 1. `f` explicitly disabled -> false
//! 2. `f` in the level's default set -> true
//! 3. otherwise whether `f` was explicitly enabled

use super::domain::{DomainLawyer, FileLoadPolicy};
use super::names::{OptionName, ScalarValue};
use super::value::{MonotonicOption, OptionValue};
use super::wildcard::WildcardGroup;
use crate::filters::{Filter, FilterCatalog, FilterSet, RewriteLevel};
use crate::primitives::{
    CACHE_INVALIDATION_TIMESTAMP_UNSET, DEFAULT_BEACON_URL, DEFAULT_CSS_INLINE_MAX_BYTES,
    DEFAULT_CSS_OUTLINE_MIN_BYTES, DEFAULT_FINDER_PROPERTIES_CACHE_EXPIRATION_MS,
    DEFAULT_HTML_CACHE_TIME_MS, DEFAULT_IMAGE_INLINE_MAX_BYTES,
    DEFAULT_IMAGE_MAX_REWRITES_AT_ONCE, DEFAULT_JS_INLINE_MAX_BYTES,
    DEFAULT_JS_OUTLINE_MIN_BYTES, DEFAULT_MAX_URL_SEGMENT_SIZE, MAX_URL_SIZE,
};
use crate::{MessageHandler, SluiceError};

/// Which explicit set a list operation writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExplicitSet {
    Enabled,
    Disabled,
}

/// One configuration scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    pub(super) modified: bool,
    pub(super) enabled_filters: FilterSet,
    pub(super) disabled_filters: FilterSet,

    pub(super) level: OptionValue<RewriteLevel>,
    pub(super) css_inline_max_bytes: OptionValue<i64>,
    pub(super) image_inline_max_bytes: OptionValue<i64>,
    pub(super) js_inline_max_bytes: OptionValue<i64>,
    pub(super) css_outline_min_bytes: OptionValue<i64>,
    pub(super) js_outline_min_bytes: OptionValue<i64>,
    pub(super) html_cache_time_ms: OptionValue<i64>,
    pub(super) beacon_url: OptionValue<String>,
    pub(super) image_max_rewrites_at_once: OptionValue<i64>,
    pub(super) max_url_segment_size: OptionValue<i64>,
    pub(super) max_url_size: OptionValue<i64>,
    pub(super) enabled: OptionValue<bool>,
    pub(super) botdetect_enabled: OptionValue<bool>,
    pub(super) combine_across_paths: OptionValue<bool>,
    pub(super) log_rewrite_timing: OptionValue<bool>,
    pub(super) lowercase_html_names: OptionValue<bool>,
    pub(super) always_rewrite_css: OptionValue<bool>,
    pub(super) respect_vary: OptionValue<bool>,
    pub(super) finder_properties_cache_expiration_time_ms: OptionValue<i64>,
    pub(super) cache_invalidation_timestamp: MonotonicOption,

    pub(super) domain_lawyer: DomainLawyer,
    pub(super) file_load_policy: FileLoadPolicy,
    pub(super) allow_resources: WildcardGroup,
    pub(super) retain_comments: WildcardGroup,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            modified: false,
            enabled_filters: FilterSet::new(),
            disabled_filters: FilterSet::new(),
            level: OptionValue::new(RewriteLevel::PassThrough),
            css_inline_max_bytes: OptionValue::new(DEFAULT_CSS_INLINE_MAX_BYTES),
            image_inline_max_bytes: OptionValue::new(DEFAULT_IMAGE_INLINE_MAX_BYTES),
            js_inline_max_bytes: OptionValue::new(DEFAULT_JS_INLINE_MAX_BYTES),
            css_outline_min_bytes: OptionValue::new(DEFAULT_CSS_OUTLINE_MIN_BYTES),
            js_outline_min_bytes: OptionValue::new(DEFAULT_JS_OUTLINE_MIN_BYTES),
            html_cache_time_ms: OptionValue::new(DEFAULT_HTML_CACHE_TIME_MS),
            beacon_url: OptionValue::new(DEFAULT_BEACON_URL.to_string()),
            image_max_rewrites_at_once: OptionValue::new(DEFAULT_IMAGE_MAX_REWRITES_AT_ONCE),
            max_url_segment_size: OptionValue::new(DEFAULT_MAX_URL_SEGMENT_SIZE),
            max_url_size: OptionValue::new(MAX_URL_SIZE),
            enabled: OptionValue::new(true),
            botdetect_enabled: OptionValue::new(false),
            combine_across_paths: OptionValue::new(true),
            log_rewrite_timing: OptionValue::new(false),
            lowercase_html_names: OptionValue::new(false),
            always_rewrite_css: OptionValue::new(false),
            respect_vary: OptionValue::new(false),
            finder_properties_cache_expiration_time_ms: OptionValue::new(
                DEFAULT_FINDER_PROPERTIES_CACHE_EXPIRATION_MS,
            ),
            cache_invalidation_timestamp: MonotonicOption::new(CACHE_INVALIDATION_TIMESTAMP_UNSET),
            domain_lawyer: DomainLawyer::new(),
            file_load_policy: FileLoadPolicy::new(),
            allow_resources: WildcardGroup::new(),
            retain_comments: WildcardGroup::new(),
        }
    }
}

impl RewriteOptions {
    /// A fresh snapshot: PassThrough, nothing explicit, every option at its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any explicit choice has been recorded.
    #[must_use]
    pub fn modified(&self) -> bool {
        self.modified
    }

    // =========================================================================
    // FILTER RESOLUTION
    // =========================================================================

    /// Whether `filter` runs under this snapshot. Pure over the three sets.
    #[must_use]
    pub fn enabled(&self, filter: Filter) -> bool {
        if self.disabled_filters.contains(&filter) {
            return false;
        }
        if FilterCatalog::global()
            .level_defaults(*self.level.value())
            .contains(&filter)
        {
            return true;
        }
        self.enabled_filters.contains(&filter)
    }

    /// Every filter `enabled()` accepts, in catalog order.
    #[must_use]
    pub fn resolved_filters(&self) -> FilterSet {
        Filter::ALL
            .iter()
            .copied()
            .filter(|f| self.enabled(*f))
            .collect()
    }

    /// Whether delay_images places low-res previews inside the image tags.
    /// They go to a deferred script instead only when both defer_javascript
    /// and lazyload_images run.
    #[must_use]
    pub fn insert_low_res_images_inplace(&self) -> bool {
        !self.enabled(Filter::DeferJavascript) || !self.enabled(Filter::LazyloadImages)
    }

    #[must_use]
    pub fn explicitly_enabled(&self) -> &FilterSet {
        &self.enabled_filters
    }

    #[must_use]
    pub fn explicitly_disabled(&self) -> &FilterSet {
        &self.disabled_filters
    }

    pub fn enable_filter(&mut self, filter: Filter) {
        self.modified |= self.enabled_filters.insert(filter);
    }

    pub fn disable_filter(&mut self, filter: Filter) {
        self.modified |= self.disabled_filters.insert(filter);
    }

    /// Enable every filter named in the comma-separated `names`.
    ///
    /// Names resolve against single filters first, then groups. Unknown
    /// names are reported to `handler` and make the call return false, but
    /// the remaining names still apply. Tokens match verbatim, so
    /// `" inline_css"` is unknown; empty tokens are skipped.
    pub fn enable_filters_by_list(&mut self, names: &str, handler: &mut dyn MessageHandler) -> bool {
        self.add_list_to_set(names, handler, ExplicitSet::Enabled)
    }

    /// Disable every filter named in `names`; same rules as
    /// [`enable_filters_by_list`](Self::enable_filters_by_list).
    pub fn disable_filters_by_list(&mut self, names: &str, handler: &mut dyn MessageHandler) -> bool {
        self.add_list_to_set(names, handler, ExplicitSet::Disabled)
    }

    fn add_list_to_set(
        &mut self,
        names: &str,
        handler: &mut dyn MessageHandler,
        target: ExplicitSet,
    ) -> bool {
        let catalog = FilterCatalog::global();
        let mut ok = true;
        for name in names.split(',').filter(|n| !n.is_empty()) {
            let filters: Vec<Filter> = if let Some(filter) = catalog.lookup_filter(name) {
                vec![filter]
            } else if let Some(group) = catalog.lookup_group(name) {
                group.iter().copied().collect()
            } else {
                handler.warning(&format!("Invalid filter name: {}", name));
                ok = false;
                continue;
            };
            for filter in filters {
                match target {
                    ExplicitSet::Enabled => self.enable_filter(filter),
                    ExplicitSet::Disabled => self.disable_filter(filter),
                }
            }
        }
        ok
    }

    /// Turn an allow-list into a fully explicit configuration: every filter
    /// not explicitly enabled becomes explicitly disabled.
    pub fn lock_to_explicit_allow_list(&mut self) {
        for filter in Filter::ALL {
            if !self.enabled_filters.contains(&filter) {
                self.disable_filter(filter);
            }
        }
    }

    // =========================================================================
    // TYPED OPTIONS
    // =========================================================================

    #[must_use]
    pub fn level(&self) -> RewriteLevel {
        *self.level.value()
    }

    pub fn set_rewrite_level(&mut self, level: RewriteLevel) {
        self.level.set(level);
        self.modified = true;
    }

    #[must_use]
    pub fn css_inline_max_bytes(&self) -> i64 {
        *self.css_inline_max_bytes.value()
    }

    #[must_use]
    pub fn image_inline_max_bytes(&self) -> i64 {
        *self.image_inline_max_bytes.value()
    }

    #[must_use]
    pub fn js_inline_max_bytes(&self) -> i64 {
        *self.js_inline_max_bytes.value()
    }

    #[must_use]
    pub fn css_outline_min_bytes(&self) -> i64 {
        *self.css_outline_min_bytes.value()
    }

    #[must_use]
    pub fn js_outline_min_bytes(&self) -> i64 {
        *self.js_outline_min_bytes.value()
    }

    #[must_use]
    pub fn html_cache_time_ms(&self) -> i64 {
        *self.html_cache_time_ms.value()
    }

    #[must_use]
    pub fn beacon_url(&self) -> &str {
        self.beacon_url.value()
    }

    #[must_use]
    pub fn image_max_rewrites_at_once(&self) -> i64 {
        *self.image_max_rewrites_at_once.value()
    }

    #[must_use]
    pub fn max_url_segment_size(&self) -> i64 {
        *self.max_url_segment_size.value()
    }

    #[must_use]
    pub fn max_url_size(&self) -> i64 {
        *self.max_url_size.value()
    }

    /// Master switch for rewriting in this scope.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        *self.enabled.value()
    }

    #[must_use]
    pub fn botdetect_enabled(&self) -> bool {
        *self.botdetect_enabled.value()
    }

    #[must_use]
    pub fn combine_across_paths(&self) -> bool {
        *self.combine_across_paths.value()
    }

    #[must_use]
    pub fn log_rewrite_timing(&self) -> bool {
        *self.log_rewrite_timing.value()
    }

    #[must_use]
    pub fn lowercase_html_names(&self) -> bool {
        *self.lowercase_html_names.value()
    }

    #[must_use]
    pub fn always_rewrite_css(&self) -> bool {
        *self.always_rewrite_css.value()
    }

    #[must_use]
    pub fn respect_vary(&self) -> bool {
        *self.respect_vary.value()
    }

    /// TTL for finder properties such as critical resources.
    #[must_use]
    pub fn finder_properties_cache_expiration_time_ms(&self) -> i64 {
        *self.finder_properties_cache_expiration_time_ms.value()
    }

    #[must_use]
    pub fn cache_invalidation_timestamp(&self) -> i64 {
        self.cache_invalidation_timestamp.value()
    }

    /// Whether the cache invalidation timestamp is still the sentinel.
    #[must_use]
    pub fn cache_invalidation_timestamp_is_unset(&self) -> bool {
        self.cache_invalidation_timestamp.is_unset()
    }

    pub fn set_finder_properties_cache_expiration_time_ms(&mut self, ttl_ms: i64) {
        self.finder_properties_cache_expiration_time_ms.set(ttl_ms);
        self.modified = true;
    }

    pub fn set_cache_invalidation_timestamp(&mut self, timestamp_ms: i64) {
        self.cache_invalidation_timestamp.set(timestamp_ms);
        self.modified = true;
    }

    /// Whether `option` was explicitly set in this scope.
    #[must_use]
    pub fn option_was_set(&self, option: OptionName) -> bool {
        match option {
            OptionName::RewriteLevel => self.level.was_set(),
            OptionName::BeaconUrl => self.beacon_url.was_set(),
            OptionName::CacheInvalidationTimestamp => self.cache_invalidation_timestamp.was_set(),
            other => match self.int_slot(other) {
                Some(slot) => slot.was_set(),
                None => self.bool_slot(other).is_some_and(|slot| slot.was_set()),
            },
        }
    }

    /// Current value of `option`, as a scalar.
    #[must_use]
    pub fn option_value(&self, option: OptionName) -> ScalarValue {
        match option {
            OptionName::RewriteLevel => ScalarValue::Text(self.level().name().to_string()),
            OptionName::BeaconUrl => ScalarValue::Text(self.beacon_url().to_string()),
            OptionName::CacheInvalidationTimestamp => {
                ScalarValue::Int(self.cache_invalidation_timestamp())
            }
            other => match (self.int_slot(other), self.bool_slot(other)) {
                (Some(slot), _) => ScalarValue::Int(*slot.value()),
                (None, Some(slot)) => ScalarValue::Bool(*slot.value()),
                (None, None) => ScalarValue::Text(String::new()),
            },
        }
    }

    /// Set `option` from a typed scalar. Text is accepted for any type and
    /// parsed; a mismatched type is an error and leaves the snapshot untouched.
    pub fn set_option(&mut self, option: OptionName, value: &ScalarValue) -> Result<(), SluiceError> {
        let value = match value {
            ScalarValue::Text(text) => option.parse_value(text)?,
            other => other.clone(),
        };
        let invalid = || SluiceError::InvalidOptionValue {
            name: option.as_str().to_string(),
            value: value.to_string(),
        };

        match (option, &value) {
            (OptionName::RewriteLevel, ScalarValue::Text(text)) => {
                let level = RewriteLevel::parse(text)
                    .ok_or_else(|| SluiceError::InvalidRewriteLevel(text.clone()))?;
                self.level.set(level);
            }
            (OptionName::BeaconUrl, ScalarValue::Text(text)) => self.beacon_url.set(text.clone()),
            (OptionName::CacheInvalidationTimestamp, ScalarValue::Int(ts)) => {
                self.cache_invalidation_timestamp.set(*ts);
            }
            (other, ScalarValue::Int(n)) => self.int_slot_mut(other).ok_or_else(invalid)?.set(*n),
            (other, ScalarValue::Bool(b)) => {
                self.bool_slot_mut(other).ok_or_else(invalid)?.set(*b);
            }
            _ => return Err(invalid()),
        }
        self.modified = true;
        Ok(())
    }

    /// Set an option by name from text, as a command line would.
    pub fn set_option_from_name(&mut self, name: &str, value: &str) -> Result<(), SluiceError> {
        let option = OptionName::from_name(name)?;
        self.set_option(option, &ScalarValue::Text(value.to_string()))
    }

    fn int_slot(&self, option: OptionName) -> Option<&OptionValue<i64>> {
        Some(match option {
            OptionName::CssInlineMaxBytes => &self.css_inline_max_bytes,
            OptionName::ImageInlineMaxBytes => &self.image_inline_max_bytes,
            OptionName::JsInlineMaxBytes => &self.js_inline_max_bytes,
            OptionName::CssOutlineMinBytes => &self.css_outline_min_bytes,
            OptionName::JsOutlineMinBytes => &self.js_outline_min_bytes,
            OptionName::HtmlCacheTimeMs => &self.html_cache_time_ms,
            OptionName::ImageMaxRewritesAtOnce => &self.image_max_rewrites_at_once,
            OptionName::MaxUrlSegmentSize => &self.max_url_segment_size,
            OptionName::MaxUrlSize => &self.max_url_size,
            OptionName::FinderPropertiesCacheExpirationTimeMs => {
                &self.finder_properties_cache_expiration_time_ms
            }
            _ => return None,
        })
    }

    fn int_slot_mut(&mut self, option: OptionName) -> Option<&mut OptionValue<i64>> {
        Some(match option {
            OptionName::CssInlineMaxBytes => &mut self.css_inline_max_bytes,
            OptionName::ImageInlineMaxBytes => &mut self.image_inline_max_bytes,
            OptionName::JsInlineMaxBytes => &mut self.js_inline_max_bytes,
            OptionName::CssOutlineMinBytes => &mut self.css_outline_min_bytes,
            OptionName::JsOutlineMinBytes => &mut self.js_outline_min_bytes,
            OptionName::HtmlCacheTimeMs => &mut self.html_cache_time_ms,
            OptionName::ImageMaxRewritesAtOnce => &mut self.image_max_rewrites_at_once,
            OptionName::MaxUrlSegmentSize => &mut self.max_url_segment_size,
            OptionName::MaxUrlSize => &mut self.max_url_size,
            OptionName::FinderPropertiesCacheExpirationTimeMs => {
                &mut self.finder_properties_cache_expiration_time_ms
            }
            _ => return None,
        })
    }

    fn bool_slot(&self, option: OptionName) -> Option<&OptionValue<bool>> {
        Some(match option {
            OptionName::Enabled => &self.enabled,
            OptionName::BotdetectEnabled => &self.botdetect_enabled,
            OptionName::CombineAcrossPaths => &self.combine_across_paths,
            OptionName::LogRewriteTiming => &self.log_rewrite_timing,
            OptionName::LowercaseHtmlNames => &self.lowercase_html_names,
            OptionName::AlwaysRewriteCss => &self.always_rewrite_css,
            OptionName::RespectVary => &self.respect_vary,
            _ => return None,
        })
    }

    fn bool_slot_mut(&mut self, option: OptionName) -> Option<&mut OptionValue<bool>> {
        Some(match option {
            OptionName::Enabled => &mut self.enabled,
            OptionName::BotdetectEnabled => &mut self.botdetect_enabled,
            OptionName::CombineAcrossPaths => &mut self.combine_across_paths,
            OptionName::LogRewriteTiming => &mut self.log_rewrite_timing,
            OptionName::LowercaseHtmlNames => &mut self.lowercase_html_names,
            OptionName::AlwaysRewriteCss => &mut self.always_rewrite_css,
            OptionName::RespectVary => &mut self.respect_vary,
            _ => return None,
        })
    }

    // =========================================================================
    // AUXILIARY SUB-CONFIGURATIONS
    // =========================================================================

    #[must_use]
    pub fn domain_lawyer(&self) -> &DomainLawyer {
        &self.domain_lawyer
    }

    pub fn domain_lawyer_mut(&mut self) -> &mut DomainLawyer {
        self.modified = true;
        &mut self.domain_lawyer
    }

    #[must_use]
    pub fn file_load_policy(&self) -> &FileLoadPolicy {
        &self.file_load_policy
    }

    pub fn file_load_policy_mut(&mut self) -> &mut FileLoadPolicy {
        self.modified = true;
        &mut self.file_load_policy
    }

    /// Resources are allowed unless a matching disallow rule says otherwise.
    #[must_use]
    pub fn is_allowed(&self, url: &str) -> bool {
        self.allow_resources.matches(url, true)
    }

    pub fn allow_resource(&mut self, spec: &str) -> Result<(), SluiceError> {
        self.allow_resources.allow(spec)?;
        self.modified = true;
        Ok(())
    }

    pub fn disallow_resource(&mut self, spec: &str) -> Result<(), SluiceError> {
        self.allow_resources.disallow(spec)?;
        self.modified = true;
        Ok(())
    }

    #[must_use]
    pub fn allow_resources(&self) -> &WildcardGroup {
        &self.allow_resources
    }

    /// Whether a comment matching `comment` must survive comment removal.
    #[must_use]
    pub fn is_retained_comment(&self, comment: &str) -> bool {
        self.retain_comments.matches(comment, false)
    }

    pub fn retain_comment(&mut self, spec: &str) -> Result<(), SluiceError> {
        self.retain_comments.allow(spec)?;
        self.modified = true;
        Ok(())
    }

    #[must_use]
    pub fn retain_comments(&self) -> &WildcardGroup {
        &self.retain_comments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CollectingMessageHandler;

    #[test]
    fn defaults() {
        let options = RewriteOptions::new();
        assert!(!options.modified());
        assert_eq!(options.level(), RewriteLevel::PassThrough);
        assert_eq!(options.css_inline_max_bytes(), 2048);
        assert_eq!(options.css_outline_min_bytes(), 2048);
        assert_eq!(options.js_outline_min_bytes(), 2048);
        assert_eq!(options.max_url_size(), 2083);
        assert_eq!(options.beacon_url(), "/mod_pagespeed_beacon?ets=");
        assert!(options.is_enabled());
        assert!(options.combine_across_paths());
        assert!(!options.respect_vary());
        assert!(options.cache_invalidation_timestamp_is_unset());
        assert!(options.resolved_filters().is_empty());
    }

    #[test]
    fn disabled_beats_level_default() {
        let mut options = RewriteOptions::new();
        options.set_rewrite_level(RewriteLevel::CoreFilters);
        options.disable_filter(Filter::CombineCss);

        assert!(!options.enabled(Filter::CombineCss));
        assert!(options.enabled(Filter::InlineCss));
    }

    #[test]
    fn disabled_beats_explicit_enable() {
        let mut options = RewriteOptions::new();
        options.enable_filter(Filter::StripScripts);
        options.disable_filter(Filter::StripScripts);

        assert!(!options.enabled(Filter::StripScripts));
    }

    #[test]
    fn explicit_enable_outside_level() {
        let mut options = RewriteOptions::new();
        options.set_rewrite_level(RewriteLevel::CoreFilters);
        options.enable_filter(Filter::RemoveComments);

        assert!(options.enabled(Filter::RemoveComments));
        assert!(!options.enabled(Filter::RemoveQuotes));
    }

    #[test]
    fn list_parsing_is_partial() {
        let mut options = RewriteOptions::new();
        let mut handler = CollectingMessageHandler::new();
        let ok = options.enable_filters_by_list("combine_css,bogus_name,inline_css", &mut handler);

        assert!(!ok);
        assert_eq!(
            options.explicitly_enabled().iter().copied().collect::<Vec<_>>(),
            vec![Filter::CombineCss, Filter::InlineCss]
        );
        assert_eq!(handler.texts(), vec!["Invalid filter name: bogus_name"]);
    }

    #[test]
    fn list_accepts_groups_and_aliases() {
        let mut options = RewriteOptions::new();
        let mut handler = CollectingMessageHandler::new();
        assert!(options.disable_filters_by_list("rewrite_images,left_trim_urls", &mut handler));

        let disabled = options.explicitly_disabled();
        assert_eq!(disabled.len(), 5);
        assert!(disabled.contains(&Filter::LeftTrimUrls));
        assert!(disabled.contains(&Filter::InlineImages));
        assert!(handler.is_empty());
    }

    #[test]
    fn empty_tokens_are_ignored() {
        let mut options = RewriteOptions::new();
        let mut handler = CollectingMessageHandler::new();
        assert!(options.enable_filters_by_list(",combine_css,,", &mut handler));
        assert_eq!(options.explicitly_enabled().len(), 1);
    }

    #[test]
    fn names_are_not_trimmed() {
        let mut options = RewriteOptions::new();
        let mut handler = CollectingMessageHandler::new();
        assert!(!options.enable_filters_by_list("combine_css, inline_css", &mut handler));
        assert!(options.enabled(Filter::CombineCss));
        assert!(!options.enabled(Filter::InlineCss));
        assert_eq!(handler.texts(), vec!["Invalid filter name:  inline_css"]);
    }

    #[test]
    fn modified_is_sticky_and_idempotent() {
        let mut options = RewriteOptions::new();
        let mut handler = CollectingMessageHandler::new();
        options.enable_filters_by_list("combine_css", &mut handler);
        assert!(options.modified());
        let snapshot = options.clone();
        options.enable_filters_by_list("combine_css", &mut handler);
        assert_eq!(options, snapshot);
    }

    #[test]
    fn unknown_only_list_does_not_modify() {
        let mut options = RewriteOptions::new();
        let mut handler = CollectingMessageHandler::new();
        assert!(!options.enable_filters_by_list("nope", &mut handler));
        assert!(!options.modified());
    }

    #[test]
    fn lock_to_explicit_allow_list_disables_the_rest() {
        let mut options = RewriteOptions::new();
        options.set_rewrite_level(RewriteLevel::AllFilters);
        options.enable_filter(Filter::CombineCss);
        options.enable_filter(Filter::ExtendCache);
        options.lock_to_explicit_allow_list();

        assert_eq!(
            options.resolved_filters().into_iter().collect::<Vec<_>>(),
            vec![Filter::CombineCss, Filter::ExtendCache]
        );
        assert_eq!(options.explicitly_disabled().len(), Filter::ALL.len() - 2);
    }

    #[test]
    fn set_option_typed_and_text() {
        let mut options = RewriteOptions::new();
        options
            .set_option(OptionName::CssInlineMaxBytes, &ScalarValue::Int(4096))
            .expect("int");
        options
            .set_option_from_name("respect_vary", "true")
            .expect("bool");
        options
            .set_option_from_name("rewrite_level", "corefilters")
            .expect("level");

        assert_eq!(options.css_inline_max_bytes(), 4096);
        assert!(options.respect_vary());
        assert_eq!(options.level(), RewriteLevel::CoreFilters);
        assert!(options.option_was_set(OptionName::CssInlineMaxBytes));
        assert!(!options.option_was_set(OptionName::JsInlineMaxBytes));
        assert!(options.modified());
    }

    #[test]
    fn set_option_rejects_type_mismatch() {
        let mut options = RewriteOptions::new();
        let err = options.set_option(OptionName::RespectVary, &ScalarValue::Int(1));
        assert!(matches!(err, Err(SluiceError::InvalidOptionValue { .. })));
        assert!(options.set_option_from_name("rewrite_level", "most").is_err());
        assert!(options.set_option_from_name("no_such_option", "1").is_err());
        assert!(!options.modified());
    }

    #[test]
    fn option_value_reports_current_values() {
        let mut options = RewriteOptions::new();
        options.set_cache_invalidation_timestamp(77);
        assert_eq!(
            options.option_value(OptionName::CacheInvalidationTimestamp),
            ScalarValue::Int(77)
        );
        assert_eq!(
            options.option_value(OptionName::Enabled),
            ScalarValue::Bool(true)
        );
        assert_eq!(
            options.option_value(OptionName::RewriteLevel),
            ScalarValue::Text("PassThrough".to_string())
        );
    }

    #[test]
    fn resource_and_comment_rules() {
        let mut options = RewriteOptions::new();
        options.disallow_resource("*.pdf").expect("rule");
        options.retain_comment("*google_ad_section*").expect("rule");

        assert!(!options.is_allowed("http://a.com/doc.pdf"));
        assert!(options.is_allowed("http://a.com/doc.html"));
        assert!(options.is_retained_comment(" google_ad_section_start "));
        assert!(!options.is_retained_comment("plain comment"));
    }

    #[test]
    fn delay_images_keeps_low_res_inline_unless_both_deferrals_run() {
        let mut options = RewriteOptions::new();
        assert!(options.insert_low_res_images_inplace());
        options.enable_filter(Filter::DeferJavascript);
        assert!(options.insert_low_res_images_inplace());
        options.enable_filter(Filter::LazyloadImages);
        assert!(!options.insert_low_res_images_inplace());
        options.disable_filter(Filter::DeferJavascript);
        assert!(options.insert_low_res_images_inplace());
    }
}
