//! # Request Context
//!
//! Per-request state: the resolved options, the page's property view, the
//! early-flush flag and the critical-resource memo slot.
//!
//! A request context is owned by one thread at a time and never shared, so
//! the memo slot needs no synchronisation.

use crate::critical::CriticalResourceRecord;
use crate::options::RewriteOptions;
use crate::property::PropertyPage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How the request's critical-resource entry was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    /// A stored record within its TTL.
    Valid,
    /// A stored record older than its TTL; its contents are not used.
    Expired,
    /// No page, no cohort, no record, or an undecodable record.
    NotFound,
    /// Seeded in-request by a filter that computed the set itself.
    Computed,
}

impl CacheStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Valid => "valid",
            CacheStatus::Expired => "expired",
            CacheStatus::NotFound => "not_found",
            CacheStatus::Computed => "computed",
        }
    }
}

/// The memoized critical-resource entry for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriticalResourceInfo {
    pub record: CriticalResourceRecord,
    pub status: CacheStatus,
}

impl CriticalResourceInfo {
    #[must_use]
    pub fn new(record: CriticalResourceRecord, status: CacheStatus) -> Self {
        Self { record, status }
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::new(CriticalResourceRecord::new(), CacheStatus::NotFound)
    }
}

/// Per-request log fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestLog {
    pub num_html_critical_resources: Option<usize>,
    pub num_css_critical_resources: Option<usize>,
}

/// State carried through the processing of one page request.
#[derive(Debug)]
pub struct RequestContext {
    options: Arc<RewriteOptions>,
    property_page: Option<PropertyPage>,
    flushing_early: bool,
    pub(crate) critical_info: Option<CriticalResourceInfo>,
    pub(crate) log: RequestLog,
}

impl RequestContext {
    pub fn new(options: Arc<RewriteOptions>) -> Self {
        Self {
            options,
            property_page: None,
            flushing_early: false,
            critical_info: None,
            log: RequestLog::default(),
        }
    }

    /// Attach the page's property view.
    #[must_use]
    pub fn with_property_page(mut self, page: PropertyPage) -> Self {
        self.property_page = Some(page);
        self
    }

    /// Mark this as an early, partial pass over a page that will be
    /// processed again in full.
    #[must_use]
    pub fn flushing_early(mut self, flushing_early: bool) -> Self {
        self.flushing_early = flushing_early;
        self
    }

    #[must_use]
    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    #[must_use]
    pub fn property_page(&self) -> Option<&PropertyPage> {
        self.property_page.as_ref()
    }

    #[must_use]
    pub fn is_flushing_early(&self) -> bool {
        self.flushing_early
    }

    #[must_use]
    pub fn log(&self) -> &RequestLog {
        &self.log
    }
}
