//! # Persistent Critical-Resource Cache
//!
//! The finder over a redb-backed property cache, across reopen.

#![allow(clippy::unwrap_used, clippy::panic)]

use sluice_core::{
    CacheStatus, CriticalContext, CriticalResourceFinder, MockClock, PropertyCache,
    RedbPropertyStore, RequestContext, RewriteOptions, Statistics,
};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn open_cache(path: &Path, clock: Arc<MockClock>) -> Arc<PropertyCache> {
    let store = RedbPropertyStore::open(path).expect("open db");
    let mut cache = PropertyCache::new(Arc::new(store), clock);
    cache.add_cohort("dom");
    Arc::new(cache)
}

fn finder() -> (Statistics, CriticalResourceFinder) {
    let mut stats = Statistics::new();
    CriticalResourceFinder::init_stats(&mut stats);
    let finder = CriticalResourceFinder::new(&stats).expect("finder");
    (stats, finder)
}

#[test]
fn critical_sets_survive_reopen() {
    let temp = tempdir().expect("temp dir");
    let db_path = temp.path().join("props.redb");
    let clock = Arc::new(MockClock::new(50_000));
    let options = Arc::new(RewriteOptions::new());
    let (_stats, finder) = finder();

    {
        let cache = open_cache(&db_path, clock.clone());
        let request = RequestContext::new(Arc::clone(&options))
            .with_property_page(cache.new_page("http://a.com/"));
        let html: BTreeSet<String> = ["http://a.com/hero.jpg".to_string()].into();
        assert!(finder.update_cache(&request, Some(html), Some(BTreeSet::new())));
    }

    let cache = open_cache(&db_path, clock);
    let mut request = RequestContext::new(options).with_property_page(cache.new_page("http://a.com/"));
    assert!(finder.is_critical(&mut request, CriticalContext::Html, "http://a.com/hero.jpg"));
    assert!(finder.critical_set(&mut request, CriticalContext::Css).is_empty());
    assert_eq!(finder.cache_status(&mut request), CacheStatus::Valid);
}

#[test]
fn empty_record_is_stored_as_placeholder() {
    let temp = tempdir().expect("temp dir");
    let db_path = temp.path().join("props.redb");
    let clock = Arc::new(MockClock::new(0));
    let (_stats, finder) = finder();

    let cache = open_cache(&db_path, clock);
    let page = cache.new_page("http://a.com/empty");
    assert!(finder.update_cache_entry(Some(&page), Some(BTreeSet::new()), None));

    let cohort = cache.get_cohort("dom").expect("cohort");
    let value = page.get_property(cohort, sluice_core::primitives::CRITICAL_RESOURCES_PROPERTY);
    assert_eq!(value.value(), sluice_core::primitives::EMPTY_VALUE_PLACEHOLDER);

    let mut request = RequestContext::new(Arc::new(RewriteOptions::new())).with_property_page(page);
    assert_eq!(finder.cache_status(&mut request), CacheStatus::Valid);
}
