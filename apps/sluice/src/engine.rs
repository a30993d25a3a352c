//! # Engine
//!
//! The process-wide decision state shared by the API and the CLI: the
//! loaded configuration, the property cache, the critical-resource finder
//! and its statistics.
//!
//! Every method here may touch the property store and therefore block.
//! Async callers go through `spawn_blocking`.

use sluice_core::primitives::CRITICAL_RESOURCES_PROPERTY;
use sluice_core::{
    Clock, CriticalResourceFinder, MemoryPropertyStore, MessageHandler, PropertyCache,
    PropertyStore, PropertyValue, RedbPropertyStore, RequestContext, RewriteOptions, Scheduler,
    ScopeConfig, SluiceConfig, SluiceError, Statistics, SystemClock, TracingMessageHandler,
};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug)]
pub struct Engine {
    config: SluiceConfig,
    statistics: Statistics,
    finder: CriticalResourceFinder,
    cache: Arc<PropertyCache>,
}

impl Engine {
    /// Open the configured store (redb if a path is set, memory otherwise).
    pub fn from_config(config: SluiceConfig) -> Result<Self, SluiceError> {
        let store: Arc<dyn PropertyStore> = match &config.store.path {
            Some(path) => {
                tracing::info!(path = %path.display(), "Opening property store");
                Arc::new(RedbPropertyStore::open(path)?)
            }
            None => {
                tracing::info!("No store path configured, properties are kept in memory");
                Arc::new(MemoryPropertyStore::new())
            }
        };
        Self::with_store(config, store, Arc::new(SystemClock))
    }

    pub fn with_store(
        config: SluiceConfig,
        store: Arc<dyn PropertyStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SluiceError> {
        if !config.validate(&mut TracingMessageHandler)? {
            tracing::warn!("Configuration has entries that were ignored");
        }

        let mut statistics = Statistics::new();
        CriticalResourceFinder::init_stats(&mut statistics);
        let finder = CriticalResourceFinder::new(&statistics)?;

        let mut cache = PropertyCache::new(store, clock);
        for cohort in &config.store.cohorts {
            cache.add_cohort(cohort);
        }
        if cache.get_cohort(finder.cohort()).is_none() {
            tracing::warn!(
                cohort = finder.cohort(),
                "Critical resources cohort is not configured, lookups will miss"
            );
        }

        Ok(Self {
            config,
            statistics,
            finder,
            cache: Arc::new(cache),
        })
    }

    pub fn config(&self) -> &SluiceConfig {
        &self.config
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn finder(&self) -> &CriticalResourceFinder {
        &self.finder
    }

    pub fn cache(&self) -> &Arc<PropertyCache> {
        &self.cache
    }

    /// Global, then `host`, then the per-request scope.
    pub fn resolve(
        &self,
        host: &str,
        request_scope: Option<&ScopeConfig>,
        handler: &mut dyn MessageHandler,
    ) -> Result<RewriteOptions, SluiceError> {
        let host_options = self.config.options_for_host(host, handler)?;
        match request_scope {
            Some(scope) => Ok(RewriteOptions::merge(
                &host_options,
                &scope.to_options(handler)?,
            )),
            None => Ok(host_options),
        }
    }

    /// A fresh request for `url` under `host`'s options.
    pub fn request(
        &self,
        host: &str,
        url: &str,
        handler: &mut dyn MessageHandler,
    ) -> Result<RequestContext, SluiceError> {
        let options = self.resolve(host, None, handler)?;
        Ok(RequestContext::new(Arc::new(options)).with_property_page(self.cache.new_page(url)))
    }

    /// Store newly computed critical sets for `url`. `None` keeps a context
    /// as stored.
    pub fn update_critical(
        &self,
        url: &str,
        html: Option<BTreeSet<String>>,
        css: Option<BTreeSet<String>>,
    ) -> bool {
        let page = self.cache.new_page(url);
        self.finder.update_cache_entry(Some(&page), html, css)
    }

    /// The stored critical-resource payload for `url`, undecoded.
    pub fn raw_critical(&self, url: &str) -> PropertyValue {
        let page = self.cache.new_page(url);
        match self.cache.get_cohort(self.finder.cohort()) {
            Some(cohort) => page.get_property(cohort, CRITICAL_RESOURCES_PROPERTY),
            None => PropertyValue::absent(),
        }
    }
}

// =============================================================================
// PERIODIC REPORTS
// =============================================================================

/// Log the lookup counters every `interval_ms`, for as long as the
/// scheduler is alive.
pub fn schedule_stats_report(scheduler: &Arc<Scheduler>, engine: Arc<Engine>, interval_ms: i64) {
    let weak = Arc::downgrade(scheduler);
    scheduler.add_alarm(
        interval_ms,
        Box::new(move || {
            let counters = engine.statistics().snapshot();
            tracing::info!(event = "stats_report", ?counters, "Critical resource lookups");
            if let Some(scheduler) = weak.upgrade() {
                schedule_stats_report(&scheduler, engine, interval_ms);
            }
        }),
    );
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::{
        CacheStatus, CollectingMessageHandler, CriticalContext, Filter, MockClock, ScalarValue,
    };
    use std::time::Duration;

    fn engine(config: SluiceConfig, clock: Arc<MockClock>) -> Engine {
        Engine::with_store(config, Arc::new(MemoryPropertyStore::new()), clock).expect("engine")
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn request_scope_layers_last() {
        let mut config = SluiceConfig::default();
        config.global.level = Some("CoreFilters".to_string());
        config.hosts.insert(
            "a.com".to_string(),
            ScopeConfig {
                disable: vec!["combine_css".to_string()],
                ..ScopeConfig::default()
            },
        );
        let engine = engine(config, Arc::new(MockClock::new(0)));
        let mut handler = CollectingMessageHandler::new();

        let host_only = engine.resolve("a.com", None, &mut handler).expect("resolve");
        assert!(!host_only.enabled(Filter::CombineCss));

        let request = ScopeConfig {
            enable: vec!["combine_css".to_string()],
            ..ScopeConfig::default()
        };
        let layered = engine
            .resolve("a.com", Some(&request), &mut handler)
            .expect("resolve");
        assert!(layered.enabled(Filter::CombineCss));
        assert!(layered.enabled(Filter::InlineCss));
    }

    #[test]
    fn uninterpretable_host_scope_fails_startup() {
        let mut config = SluiceConfig::default();
        config.hosts.insert(
            "a.com".to_string(),
            ScopeConfig {
                options: [("css_inline_max_bytes".to_string(), ScalarValue::Text("big".to_string()))]
                    .into(),
                ..ScopeConfig::default()
            },
        );
        let result = Engine::with_store(
            config,
            Arc::new(MemoryPropertyStore::new()),
            Arc::new(MockClock::new(0)),
        );
        assert!(result.is_err());

        let mut config = SluiceConfig::default();
        config.global.enable = vec!["inline_css,bogus".to_string()];
        let engine = engine(config, Arc::new(MockClock::new(0)));
        let mut handler = CollectingMessageHandler::new();
        let options = engine.resolve("", None, &mut handler).expect("resolve");
        assert!(options.enabled(Filter::InlineCss));
    }

    #[test]
    fn critical_round_trip_through_engine() {
        let engine = engine(SluiceConfig::default(), Arc::new(MockClock::new(10_000)));
        let mut handler = CollectingMessageHandler::new();

        assert!(engine.update_critical("http://a.com/", Some(set(&["hero.jpg"])), None));
        assert!(engine.raw_critical("http://a.com/").has_value());

        let mut request = engine
            .request("a.com", "http://a.com/", &mut handler)
            .expect("request");
        let finder = engine.finder();
        assert!(finder.is_critical(&mut request, CriticalContext::Html, "hero.jpg"));
        assert_eq!(finder.cache_status(&mut request), CacheStatus::Valid);
        assert_eq!(
            engine.statistics().snapshot()["critical_resources_valid_count"],
            1
        );
    }

    #[test]
    fn missing_cohort_misses() {
        let mut config = SluiceConfig::default();
        config.store.cohorts = vec!["beacon".to_string()];
        let engine = engine(config, Arc::new(MockClock::new(0)));

        assert!(!engine.update_critical("http://a.com/", Some(set(&["x"])), None));
        assert!(!engine.raw_critical("http://a.com/").has_value());
    }

    #[test]
    fn stats_report_reschedules_itself() {
        let clock = Arc::new(MockClock::new(0));
        let engine = Arc::new(engine(SluiceConfig::default(), Arc::clone(&clock)));
        let scheduler = Arc::new(Scheduler::new(clock.clone()));

        schedule_stats_report(&scheduler, engine, 1_000);
        assert_eq!(scheduler.pending_alarms(), 1);
        assert_eq!(scheduler.process_alarms(Duration::ZERO), 0);

        clock.advance_ms(1_000);
        assert_eq!(scheduler.process_alarms(Duration::ZERO), 1);
        assert_eq!(scheduler.pending_alarms(), 1);
    }
}
