//! # Options Merge
//!
//! `merge(first, second)` layers `second` on top of `first` and returns a
//! fresh snapshot. Neither input is touched. Merge is total: list parsing
//! already rejected bad names, so nothing here can fail.

use super::domain::{DomainLawyer, FileLoadPolicy};
use super::rewrite_options::RewriteOptions;
use super::value::{MonotonicOption, OptionValue};
use super::wildcard::WildcardGroup;

impl RewriteOptions {
    /// `second` layered on `first`.
    ///
    /// Filters `second` explicitly enables move into the enabled set; filters
    /// it explicitly disables move into the disabled set afterwards, so a
    /// filter `second` both enables and disables ends up disabled.
    #[must_use]
    pub fn merge(first: &RewriteOptions, second: &RewriteOptions) -> RewriteOptions {
        let mut enabled_filters = first.enabled_filters.clone();
        let mut disabled_filters = first.disabled_filters.clone();
        for filter in &second.enabled_filters {
            disabled_filters.remove(filter);
            enabled_filters.insert(*filter);
        }
        for filter in &second.disabled_filters {
            enabled_filters.remove(filter);
            disabled_filters.insert(*filter);
        }

        let mut domain_lawyer = DomainLawyer::new();
        domain_lawyer.merge(&first.domain_lawyer);
        domain_lawyer.merge(&second.domain_lawyer);

        let mut file_load_policy = FileLoadPolicy::new();
        file_load_policy.merge(&first.file_load_policy);
        file_load_policy.merge(&second.file_load_policy);

        RewriteOptions {
            modified: first.modified || second.modified,
            enabled_filters,
            disabled_filters,

            level: OptionValue::merged(&first.level, &second.level),
            css_inline_max_bytes: OptionValue::merged(
                &first.css_inline_max_bytes,
                &second.css_inline_max_bytes,
            ),
            image_inline_max_bytes: OptionValue::merged(
                &first.image_inline_max_bytes,
                &second.image_inline_max_bytes,
            ),
            js_inline_max_bytes: OptionValue::merged(
                &first.js_inline_max_bytes,
                &second.js_inline_max_bytes,
            ),
            css_outline_min_bytes: OptionValue::merged(
                &first.css_outline_min_bytes,
                &second.css_outline_min_bytes,
            ),
            js_outline_min_bytes: OptionValue::merged(
                &first.js_outline_min_bytes,
                &second.js_outline_min_bytes,
            ),
            html_cache_time_ms: OptionValue::merged(
                &first.html_cache_time_ms,
                &second.html_cache_time_ms,
            ),
            beacon_url: OptionValue::merged(&first.beacon_url, &second.beacon_url),
            image_max_rewrites_at_once: OptionValue::merged(
                &first.image_max_rewrites_at_once,
                &second.image_max_rewrites_at_once,
            ),
            max_url_segment_size: OptionValue::merged(
                &first.max_url_segment_size,
                &second.max_url_segment_size,
            ),
            max_url_size: OptionValue::merged(&first.max_url_size, &second.max_url_size),
            enabled: OptionValue::merged(&first.enabled, &second.enabled),
            botdetect_enabled: OptionValue::merged(
                &first.botdetect_enabled,
                &second.botdetect_enabled,
            ),
            combine_across_paths: OptionValue::merged(
                &first.combine_across_paths,
                &second.combine_across_paths,
            ),
            log_rewrite_timing: OptionValue::merged(
                &first.log_rewrite_timing,
                &second.log_rewrite_timing,
            ),
            lowercase_html_names: OptionValue::merged(
                &first.lowercase_html_names,
                &second.lowercase_html_names,
            ),
            always_rewrite_css: OptionValue::merged(
                &first.always_rewrite_css,
                &second.always_rewrite_css,
            ),
            respect_vary: OptionValue::merged(&first.respect_vary, &second.respect_vary),
            finder_properties_cache_expiration_time_ms: OptionValue::merged(
                &first.finder_properties_cache_expiration_time_ms,
                &second.finder_properties_cache_expiration_time_ms,
            ),
            cache_invalidation_timestamp: MonotonicOption::merged(
                &first.cache_invalidation_timestamp,
                &second.cache_invalidation_timestamp,
            ),

            domain_lawyer,
            file_load_policy,
            allow_resources: WildcardGroup::merged(&first.allow_resources, &second.allow_resources),
            retain_comments: WildcardGroup::merged(&first.retain_comments, &second.retain_comments),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CollectingMessageHandler;
    use crate::filters::{Filter, RewriteLevel};

    #[test]
    fn second_enable_clears_first_disable() {
        let mut first = RewriteOptions::new();
        first.disable_filter(Filter::CombineCss);
        let mut second = RewriteOptions::new();
        second.enable_filter(Filter::CombineCss);

        let merged = RewriteOptions::merge(&first, &second);
        assert!(merged.enabled(Filter::CombineCss));
        assert!(!merged.explicitly_disabled().contains(&Filter::CombineCss));
    }

    #[test]
    fn second_disable_clears_first_enable() {
        let mut first = RewriteOptions::new();
        first.enable_filter(Filter::InlineCss);
        let mut second = RewriteOptions::new();
        second.disable_filter(Filter::InlineCss);

        let merged = RewriteOptions::merge(&first, &second);
        assert!(!merged.enabled(Filter::InlineCss));
        assert!(!merged.explicitly_enabled().contains(&Filter::InlineCss));
    }

    #[test]
    fn disable_wins_when_second_does_both() {
        let mut second = RewriteOptions::new();
        second.enable_filter(Filter::RemoveQuotes);
        second.disable_filter(Filter::RemoveQuotes);

        let merged = RewriteOptions::merge(&RewriteOptions::new(), &second);
        assert!(!merged.enabled(Filter::RemoveQuotes));
    }

    #[test]
    fn untouched_filters_keep_first_choice() {
        let mut first = RewriteOptions::new();
        first.enable_filter(Filter::StripScripts);
        let mut second = RewriteOptions::new();
        second.enable_filter(Filter::CombineCss);

        let merged = RewriteOptions::merge(&first, &second);
        assert!(merged.enabled(Filter::StripScripts));
        assert!(merged.enabled(Filter::CombineCss));
    }

    #[test]
    fn modified_is_or() {
        let mut first = RewriteOptions::new();
        first.enable_filter(Filter::AddHead);
        assert!(RewriteOptions::merge(&first, &RewriteOptions::new()).modified());
        assert!(RewriteOptions::merge(&RewriteOptions::new(), &first).modified());
        assert!(!RewriteOptions::merge(&RewriteOptions::new(), &RewriteOptions::new()).modified());
    }

    #[test]
    fn inputs_are_untouched() {
        let mut first = RewriteOptions::new();
        first.enable_filter(Filter::AddHead);
        let mut second = RewriteOptions::new();
        second.disable_filter(Filter::AddHead);
        let (first_before, second_before) = (first.clone(), second.clone());

        let _ = RewriteOptions::merge(&first, &second);
        assert_eq!(first, first_before);
        assert_eq!(second, second_before);
    }

    #[test]
    fn level_and_scalars_override() {
        let mut first = RewriteOptions::new();
        first.set_rewrite_level(RewriteLevel::CoreFilters);
        first
            .set_option_from_name("css_inline_max_bytes", "100")
            .expect("set");
        let mut second = RewriteOptions::new();
        second
            .set_option_from_name("js_inline_max_bytes", "200")
            .expect("set");

        let merged = RewriteOptions::merge(&first, &second);
        assert_eq!(merged.level(), RewriteLevel::CoreFilters);
        assert_eq!(merged.css_inline_max_bytes(), 100);
        assert_eq!(merged.js_inline_max_bytes(), 200);

        let mut third = RewriteOptions::new();
        third.set_rewrite_level(RewriteLevel::PassThrough);
        let merged = RewriteOptions::merge(&merged, &third);
        assert_eq!(merged.level(), RewriteLevel::PassThrough);
    }

    #[test]
    fn invalidation_timestamp_never_moves_backwards() {
        let mut first = RewriteOptions::new();
        first.set_cache_invalidation_timestamp(2_000);
        let mut second = RewriteOptions::new();
        second.set_cache_invalidation_timestamp(1_000);

        assert_eq!(
            RewriteOptions::merge(&first, &second).cache_invalidation_timestamp(),
            2_000
        );
        assert_eq!(
            RewriteOptions::merge(&second, &first).cache_invalidation_timestamp(),
            2_000
        );
        assert!(
            RewriteOptions::merge(&RewriteOptions::new(), &RewriteOptions::new())
                .cache_invalidation_timestamp_is_unset()
        );
    }

    #[test]
    fn auxiliary_lists_accumulate() {
        let mut handler = CollectingMessageHandler::new();
        let mut first = RewriteOptions::new();
        first.disallow_resource("*.pdf").expect("rule");
        first
            .domain_lawyer_mut()
            .add_rewrite_domain_mapping("one.com", "src.com", &mut handler);
        first
            .file_load_policy_mut()
            .associate("http://a.com/", "/a/")
            .expect("associate");

        let mut second = RewriteOptions::new();
        second.allow_resource("*/public/*").expect("rule");
        second.retain_comment("keep*").expect("rule");
        second
            .domain_lawyer_mut()
            .add_rewrite_domain_mapping("two.com", "src.com", &mut handler);

        let merged = RewriteOptions::merge(&first, &second);
        assert_eq!(merged.allow_resources().len(), 2);
        assert!(merged.is_allowed("http://a.com/public/x.pdf"));
        assert!(!merged.is_allowed("http://a.com/x.pdf"));
        assert!(merged.is_retained_comment("keep me"));
        assert_eq!(merged.domain_lawyer().rewrite_domain("src.com"), Some("two.com"));
        assert_eq!(
            merged.file_load_policy().should_load_from_file("http://a.com/x.css"),
            Some("/a/x.css".to_string())
        );
    }

    #[test]
    fn merge_is_stable_under_relayering() {
        let mut handler = CollectingMessageHandler::new();
        let mut a = RewriteOptions::new();
        a.enable_filters_by_list("combine_css,extend_cache", &mut handler);
        a.disable_filters_by_list("inline_css", &mut handler);
        let mut b = RewriteOptions::new();
        b.enable_filters_by_list("inline_css", &mut handler);
        b.disable_filters_by_list("combine_css,strip_scripts", &mut handler);

        let ab = RewriteOptions::merge(&a, &b);
        let a_ab = RewriteOptions::merge(&a, &ab);
        assert_eq!(a_ab.explicitly_enabled(), ab.explicitly_enabled());
        assert_eq!(a_ab.explicitly_disabled(), ab.explicitly_disabled());
    }
}
