//! # Precedence Tier Tests (T0-T3)
//!
//! If ANY tier fails, filter resolution or critical-resource caching is
//! INVALID.
//!
//! ## Tiers
//! - T0: Catalog and level defaults
//! - T1: Enabled precedence and list parsing
//! - T2: Layered merge
//! - T3: Critical-resource cache behaviour

use sluice_core::{
    CacheStatus, CollectingMessageHandler, CriticalContext, CriticalResourceFinder, Filter,
    FilterCatalog, MemoryPropertyStore, MockClock, PropertyCache, RequestContext, RewriteLevel,
    RewriteOptions, Statistics,
};
use std::collections::BTreeSet;
use std::sync::Arc;

// =============================================================================
// TIER T0: CATALOG
// =============================================================================

mod t0_catalog {
    use super::*;

    /// T0.1: With empty explicit sets, enabled() equals level membership.
    #[test]
    fn empty_sets_follow_level_defaults() {
        for level in RewriteLevel::ALL {
            let mut options = RewriteOptions::new();
            options.set_rewrite_level(level);
            let defaults = FilterCatalog::global().level_defaults(level);
            for filter in Filter::ALL {
                assert_eq!(options.enabled(filter), defaults.contains(&filter));
            }
        }
    }

    /// T0.2: PassThrough enables nothing.
    #[test]
    fn pass_through_is_empty() {
        assert!(RewriteOptions::new().resolved_filters().is_empty());
    }

    /// T0.3: Every canonical name resolves back to its filter.
    #[test]
    fn canonical_names_resolve() {
        let catalog = FilterCatalog::global();
        for filter in Filter::ALL {
            assert_eq!(catalog.lookup_filter(filter.name()), Some(filter));
        }
    }
}

// =============================================================================
// TIER T1: PRECEDENCE
// =============================================================================

mod t1_precedence {
    use super::*;

    /// T1.1: level=CoreFilters, disabled={combine_css}.
    #[test]
    fn core_level_with_one_disable() {
        let mut options = RewriteOptions::new();
        options.set_rewrite_level(RewriteLevel::CoreFilters);
        options.disable_filter(Filter::CombineCss);

        assert!(!options.enabled(Filter::CombineCss));
        assert!(options.enabled(Filter::InlineCss));
    }

    /// T1.2: Disabled wins at every level, even when explicitly enabled.
    #[test]
    fn disabled_always_wins() {
        for level in RewriteLevel::ALL {
            let mut options = RewriteOptions::new();
            options.set_rewrite_level(level);
            options.enable_filter(Filter::ExtendCache);
            options.disable_filter(Filter::ExtendCache);
            assert!(!options.enabled(Filter::ExtendCache));
        }
    }

    /// T1.3: A list with an unknown name applies partially and reports failure.
    #[test]
    fn partial_list_application() {
        let mut options = RewriteOptions::new();
        let mut handler = CollectingMessageHandler::new();

        assert!(!options.enable_filters_by_list("combine_css,bogus_name,inline_css", &mut handler));
        let expected: BTreeSet<Filter> = [Filter::CombineCss, Filter::InlineCss].into();
        assert_eq!(options.explicitly_enabled(), &expected);
        assert_eq!(handler.messages().len(), 1);
    }

    /// T1.4: Groups expand to their members.
    #[test]
    fn group_names_expand() {
        let mut options = RewriteOptions::new();
        let mut handler = CollectingMessageHandler::new();
        assert!(options.enable_filters_by_list("rewrite_images", &mut handler));

        assert!(options.enabled(Filter::RecompressImages));
        assert!(options.enabled(Filter::InsertImageDimensions));
        assert!(!options.enabled(Filter::SpriteImages));
    }
}

// =============================================================================
// TIER T2: MERGE
// =============================================================================

mod t2_merge {
    use super::*;

    /// T2.1: Merge(A,B) agrees with B wherever B made an explicit choice.
    #[test]
    fn explicit_choices_of_second_win() {
        let mut handler = CollectingMessageHandler::new();
        let mut a = RewriteOptions::new();
        a.set_rewrite_level(RewriteLevel::CoreFilters);
        a.enable_filters_by_list("remove_comments,strip_scripts", &mut handler);
        a.disable_filters_by_list("inline_css", &mut handler);

        let mut b = RewriteOptions::new();
        b.enable_filters_by_list("inline_css", &mut handler);
        b.disable_filters_by_list("remove_comments,combine_css", &mut handler);

        let merged = RewriteOptions::merge(&a, &b);
        for filter in [Filter::InlineCss, Filter::RemoveComments, Filter::CombineCss] {
            assert_eq!(merged.enabled(filter), b.enabled(filter), "{}", filter);
        }
        // untouched by b: a's explicit choice
        assert!(merged.enabled(Filter::StripScripts));
        // untouched by both: level default
        assert!(merged.enabled(Filter::ExtendCache));
        assert!(!merged.enabled(Filter::RemoveQuotes));
    }

    /// T2.2: Global -> host -> request layering.
    #[test]
    fn three_scopes() {
        let mut global = RewriteOptions::new();
        global.set_rewrite_level(RewriteLevel::CoreFilters);
        global.set_cache_invalidation_timestamp(5_000);

        let mut host = RewriteOptions::new();
        host.disable_filter(Filter::CombineCss);
        host.set_cache_invalidation_timestamp(1_000);

        let mut request = RewriteOptions::new();
        request.enable_filter(Filter::CombineCss);

        let resolved = RewriteOptions::merge(&RewriteOptions::merge(&global, &host), &request);
        assert!(resolved.enabled(Filter::CombineCss));
        assert_eq!(resolved.level(), RewriteLevel::CoreFilters);
        assert_eq!(resolved.cache_invalidation_timestamp(), 5_000);
    }
}

// =============================================================================
// TIER T3: CRITICAL RESOURCES
// =============================================================================

mod t3_critical {
    use super::*;

    struct World {
        stats: Statistics,
        finder: CriticalResourceFinder,
        cache: Arc<PropertyCache>,
        clock: Arc<MockClock>,
        options: Arc<RewriteOptions>,
    }

    fn world(ttl_ms: i64) -> World {
        let mut stats = Statistics::new();
        CriticalResourceFinder::init_stats(&mut stats);
        let finder = CriticalResourceFinder::new(&stats).expect("finder");
        let clock = Arc::new(MockClock::new(1_000_000));
        let mut cache = PropertyCache::new(Arc::new(MemoryPropertyStore::new()), clock.clone());
        cache.add_cohort(finder.cohort());
        let mut options = RewriteOptions::new();
        options.set_finder_properties_cache_expiration_time_ms(ttl_ms);
        World {
            stats,
            finder,
            cache: Arc::new(cache),
            clock,
            options: Arc::new(options),
        }
    }

    impl World {
        fn request(&self, url: &str) -> RequestContext {
            RequestContext::new(Arc::clone(&self.options)).with_property_page(self.cache.new_page(url))
        }

        fn count(&self, name: &str) -> u64 {
            self.stats.snapshot().get(name).copied().unwrap_or(0)
        }
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    /// T3.1: html round trip leaves css empty but fresh.
    #[test]
    fn html_round_trip() {
        let w = world(60_000);
        assert!(w.finder.update_cache(&w.request("http://a.com/"), Some(set(&["a", "b"])), None));

        let mut request = w.request("http://a.com/");
        assert_eq!(w.finder.critical_set(&mut request, CriticalContext::Html), &set(&["a", "b"]));
        assert!(w.finder.critical_set(&mut request, CriticalContext::Css).is_empty());
        assert_eq!(w.finder.cache_status(&mut request), CacheStatus::Valid);
    }

    /// T3.2: N lookups on an absent record count N not-found.
    #[test]
    fn not_found_totals() {
        let w = world(60_000);
        for n in 0..7 {
            let mut request = w.request(&format!("http://a.com/{}", n));
            assert!(!w.finder.is_critical(&mut request, CriticalContext::Html, "x"));
        }
        assert_eq!(w.count("critical_resources_not_found_count"), 7);
        assert_eq!(w.count("critical_resources_valid_count"), 0);
        assert_eq!(w.count("critical_resources_expired_count"), 0);
    }

    /// T3.3: Fresh through T + ttl, expired after.
    #[test]
    fn ttl_edges() {
        let ttl = 5_000;
        let w = world(ttl);
        w.finder.update_cache(&w.request("http://a.com/"), None, Some(set(&["bg.png"])));

        w.clock.advance_ms(ttl);
        let mut at_edge = w.request("http://a.com/");
        assert!(w.finder.is_critical(&mut at_edge, CriticalContext::Css, "bg.png"));

        w.clock.advance_ms(1);
        let mut past_edge = w.request("http://a.com/");
        assert!(!w.finder.is_critical(&mut past_edge, CriticalContext::Css, "bg.png"));
        assert_eq!(w.finder.cache_status(&mut past_edge), CacheStatus::Expired);
    }

    /// T3.4: Rewriting refreshes the write time.
    #[test]
    fn rewrite_refreshes_ttl() {
        let ttl = 5_000;
        let w = world(ttl);
        w.finder.update_cache(&w.request("http://a.com/"), Some(set(&["a"])), None);
        w.clock.advance_ms(ttl + 1);
        w.finder.update_cache(&w.request("http://a.com/"), Some(set(&["b"])), None);

        let mut request = w.request("http://a.com/");
        assert!(w.finder.is_critical(&mut request, CriticalContext::Html, "b"));
        assert!(!w.finder.is_critical(&mut request, CriticalContext::Html, "a"));
    }
}
