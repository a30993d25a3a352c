//! # Critical Resource Finder
//!
//! Answers "which resources are critical for this page?" from the property
//! cache, at most once per request.
//!
//! ## Lookup
//!
//! The first query on a request resolves the cohort, reads the stored
//! record and classifies it:
//!
//! | stored value | classification | sets returned |
//! |--------------|----------------|---------------|
//! | no page / no cohort / absent | `NotFound` | empty |
//! | present, `now - written > ttl` (not decoded) | `Expired` | empty |
//! | present, within ttl, undecodable | `NotFound` | empty |
//! | present, within ttl | `Valid` | decoded |
//!
//! Exactly one counter is incremented per populated entry, unless the
//! request is flushing early. Later queries on the same request read the
//! memo and touch neither the store nor the counters.
//!
//! ## Write-back
//!
//! `update_cache` is a read-modify-write of the whole record with no
//! compare-and-swap. Two requests updating different contexts of the same
//! page concurrently can lose one of the two updates.

use super::CriticalResourceRecord;
use crate::formats::{record_from_payload, record_to_payload};
use crate::primitives::{
    CRITICAL_RESOURCES_EXPIRED_COUNT, CRITICAL_RESOURCES_NOT_FOUND_COUNT,
    CRITICAL_RESOURCES_PROPERTY, CRITICAL_RESOURCES_VALID_COUNT, DEFAULT_CRITICAL_COHORT,
};
use crate::property::{PropertyCache, PropertyPage, PropertyValue};
use crate::request::{CacheStatus, CriticalResourceInfo, RequestContext};
use crate::stats::{Statistics, Variable};
use crate::{CriticalContext, SluiceError};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Process-wide finder. Holds no per-request state.
#[derive(Debug)]
pub struct CriticalResourceFinder {
    cohort: String,
    valid_count: Arc<Variable>,
    expired_count: Arc<Variable>,
    not_found_count: Arc<Variable>,
}

impl CriticalResourceFinder {
    /// Register the finder's counters. Call once at startup, before the
    /// statistics registry is shared.
    pub fn init_stats(statistics: &mut Statistics) {
        statistics.add_variable(CRITICAL_RESOURCES_VALID_COUNT);
        statistics.add_variable(CRITICAL_RESOURCES_EXPIRED_COUNT);
        statistics.add_variable(CRITICAL_RESOURCES_NOT_FOUND_COUNT);
    }

    /// A finder reading the default cohort.
    pub fn new(statistics: &Statistics) -> Result<Self, SluiceError> {
        Self::with_cohort(statistics, DEFAULT_CRITICAL_COHORT)
    }

    /// A finder reading `cohort`. Fails if `init_stats` was not called.
    pub fn with_cohort(statistics: &Statistics, cohort: &str) -> Result<Self, SluiceError> {
        Ok(Self {
            cohort: cohort.to_string(),
            valid_count: statistics.get_variable(CRITICAL_RESOURCES_VALID_COUNT)?,
            expired_count: statistics.get_variable(CRITICAL_RESOURCES_EXPIRED_COUNT)?,
            not_found_count: statistics.get_variable(CRITICAL_RESOURCES_NOT_FOUND_COUNT)?,
        })
    }

    #[must_use]
    pub fn cohort(&self) -> &str {
        &self.cohort
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    /// The best-known critical set for `context` on this request.
    pub fn critical_set<'r>(
        &self,
        request: &'r mut RequestContext,
        context: CriticalContext,
    ) -> &'r BTreeSet<String> {
        self.ensure_populated(request).record.get(context)
    }

    /// Whether `url` is in the critical set for `context`.
    pub fn is_critical(&self, request: &mut RequestContext, context: CriticalContext, url: &str) -> bool {
        self.critical_set(request, context).contains(url)
    }

    /// Classification of this request's entry, populating it if needed.
    pub fn cache_status(&self, request: &mut RequestContext) -> CacheStatus {
        self.ensure_populated(request).status
    }

    /// Seed one context of the request's entry with a set computed in-request.
    ///
    /// Does not query the store. If the entry was already populated the
    /// other context is preserved.
    pub fn set_critical_set(
        &self,
        request: &mut RequestContext,
        context: CriticalContext,
        resources: BTreeSet<String>,
    ) {
        request
            .critical_info
            .get_or_insert_with(|| {
                CriticalResourceInfo::new(CriticalResourceRecord::new(), CacheStatus::Computed)
            })
            .record
            .set(context, resources);
    }

    fn ensure_populated<'r>(&self, request: &'r mut RequestContext) -> &'r CriticalResourceInfo {
        if request.critical_info.is_none() {
            let info = self.lookup(request);
            request.critical_info = Some(info);
        }
        request
            .critical_info
            .get_or_insert_with(CriticalResourceInfo::not_found)
    }

    fn lookup(&self, request: &mut RequestContext) -> CriticalResourceInfo {
        let track_stats = !request.is_flushing_early();

        let Some(page) = request.property_page() else {
            self.record_status(CacheStatus::NotFound, track_stats);
            return CriticalResourceInfo::not_found();
        };
        let cache = page.cache();
        let Some(cohort) = cache.get_cohort(&self.cohort) else {
            tracing::warn!(cohort = %self.cohort, "Critical resources cohort is not registered");
            self.record_status(CacheStatus::NotFound, track_stats);
            return CriticalResourceInfo::not_found();
        };

        let value = page.get_property(cohort, CRITICAL_RESOURCES_PROPERTY);
        let ttl_ms = request.options().finder_properties_cache_expiration_time_ms();
        let info = self.extract_from_cache(cache, &value, ttl_ms, track_stats);
        tracing::debug!(page = page.key(), status = info.status.as_str(), "Critical resources looked up");

        request.log.num_html_critical_resources = Some(info.record.html.len());
        request.log.num_css_critical_resources = Some(info.record.css.len());
        info
    }

    fn extract_from_cache(
        &self,
        cache: &PropertyCache,
        value: &PropertyValue,
        ttl_ms: i64,
        track_stats: bool,
    ) -> CriticalResourceInfo {
        let info = if !value.has_value() {
            CriticalResourceInfo::not_found()
        } else if cache.is_expired(value, ttl_ms) {
            CriticalResourceInfo::new(CriticalResourceRecord::new(), CacheStatus::Expired)
        } else {
            match record_from_payload(value.value()) {
                Err(e) => {
                    tracing::debug!(error = %e, "Undecodable critical resources treated as absent");
                    CriticalResourceInfo::not_found()
                }
                Ok(record) => CriticalResourceInfo::new(record, CacheStatus::Valid),
            }
        };
        self.record_status(info.status, track_stats);
        info
    }

    fn record_status(&self, status: CacheStatus, track_stats: bool) {
        if !track_stats {
            return;
        }
        match status {
            CacheStatus::Valid => self.valid_count.increment(),
            CacheStatus::Expired => self.expired_count.increment(),
            CacheStatus::NotFound => self.not_found_count.increment(),
            CacheStatus::Computed => {}
        }
    }

    // =========================================================================
    // WRITE-BACK
    // =========================================================================

    /// Store newly computed sets for the request's page.
    ///
    /// `None` leaves that context's stored set untouched. Returns true iff at
    /// least one context was supplied and the record was written. The
    /// request's own memo is not refreshed.
    pub fn update_cache(
        &self,
        request: &RequestContext,
        html: Option<BTreeSet<String>>,
        css: Option<BTreeSet<String>>,
    ) -> bool {
        self.update_cache_entry(request.property_page(), html, css)
    }

    /// [`update_cache`](Self::update_cache) for a page without a request.
    pub fn update_cache_entry(
        &self,
        page: Option<&PropertyPage>,
        html: Option<BTreeSet<String>>,
        css: Option<BTreeSet<String>>,
    ) -> bool {
        let Some(page) = page else {
            return false;
        };
        let Some(cohort) = page.cache().get_cohort(&self.cohort) else {
            tracing::warn!(cohort = %self.cohort, "Critical resources cohort is not registered");
            return false;
        };
        if html.is_none() && css.is_none() {
            return false;
        }

        let current = page.get_property(cohort, CRITICAL_RESOURCES_PROPERTY);
        let mut record = if current.has_value() {
            record_from_payload(current.value()).unwrap_or_default()
        } else {
            CriticalResourceRecord::new()
        };
        if let Some(html) = html {
            record.set(CriticalContext::Html, html);
        }
        if let Some(css) = css {
            record.set(CriticalContext::Css, css);
        }

        let payload = match record_to_payload(&record) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(page = page.key(), error = %e, "Serialization of critical resources failed");
                return false;
            }
        };
        if let Err(e) = page.update_value(cohort, CRITICAL_RESOURCES_PROPERTY, payload) {
            tracing::warn!(page = page.key(), error = %e, "Writing critical resources failed");
            return false;
        }
        true
    }
}
