//! # Property Cache
//!
//! The page property cache the critical-resource finder reads from and
//! writes back to.
//!
//! ```text
//! PropertyCache (process-wide, shared behind Arc)
//!   ├── cohorts: named groups of properties
//!   ├── store:   Arc<dyn PropertyStore>   (memory, redb, ...)
//!   └── clock:   Arc<dyn Clock>           (write times, TTL checks)
//!
//! PropertyPage (one per request, keyed by page URL)
//!   ├── get_property(cohort, name) -> PropertyValue
//!   └── update_value(cohort, name, bytes)
//! ```
//!
//! Store calls may block. Callers on an async runtime dispatch them to a
//! blocking pool.

pub mod memory;

pub use memory::MemoryPropertyStore;

use crate::SluiceError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

// =============================================================================
// CLOCK
// =============================================================================

/// Wall-clock source in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct MockClock {
    now_ms: AtomicI64,
}

impl MockClock {
    #[must_use]
    pub fn new(start_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(start_ms),
        }
    }

    pub fn set_ms(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

// =============================================================================
// STORE CONTRACT
// =============================================================================

/// Address of one stored property.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PropertyKey {
    pub page: String,
    pub cohort: String,
    pub property: String,
}

impl PropertyKey {
    pub fn new(page: impl Into<String>, cohort: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            cohort: cohort.into(),
            property: property.into(),
        }
    }
}

/// Bytes and write time as held by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProperty {
    pub bytes: Vec<u8>,
    pub write_time_ms: i64,
}

/// Key-value backend for the property cache.
///
/// A `put` replaces the whole stored value for the key. There is no
/// compare-and-swap; concurrent read-modify-write callers race and the last
/// `put` wins.
pub trait PropertyStore: Send + Sync + fmt::Debug {
    fn get(&self, key: &PropertyKey) -> Result<Option<StoredProperty>, SluiceError>;

    fn put(&self, key: &PropertyKey, value: StoredProperty) -> Result<(), SluiceError>;
}

// =============================================================================
// PROPERTY VALUE
// =============================================================================

/// A property as read through a page: possibly absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyValue {
    stored: Option<StoredProperty>,
}

impl PropertyValue {
    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn has_value(&self) -> bool {
        self.stored.is_some()
    }

    /// Raw bytes; empty when absent.
    #[must_use]
    pub fn value(&self) -> &[u8] {
        self.stored.as_ref().map(|s| s.bytes.as_slice()).unwrap_or(&[])
    }

    #[must_use]
    pub fn write_time_ms(&self) -> Option<i64> {
        self.stored.as_ref().map(|s| s.write_time_ms)
    }
}

impl From<Option<StoredProperty>> for PropertyValue {
    fn from(stored: Option<StoredProperty>) -> Self {
        Self { stored }
    }
}

// =============================================================================
// COHORTS AND CACHE
// =============================================================================

/// A named group of properties sharing storage policy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cohort {
    name: String,
}

impl Cohort {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Process-wide property cache: registered cohorts over a store.
#[derive(Debug)]
pub struct PropertyCache {
    store: Arc<dyn PropertyStore>,
    clock: Arc<dyn Clock>,
    cohorts: BTreeMap<String, Cohort>,
}

impl PropertyCache {
    pub fn new(store: Arc<dyn PropertyStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            cohorts: BTreeMap::new(),
        }
    }

    /// Register a cohort. Registration happens before the cache is shared.
    pub fn add_cohort(&mut self, name: &str) -> &Cohort {
        self.cohorts.entry(name.to_string()).or_insert_with(|| Cohort {
            name: name.to_string(),
        })
    }

    #[must_use]
    pub fn get_cohort(&self, name: &str) -> Option<&Cohort> {
        self.cohorts.get(name)
    }

    pub fn cohorts(&self) -> impl Iterator<Item = &Cohort> {
        self.cohorts.values()
    }

    /// Absent values count as expired. A present value is expired once
    /// `now - write_time > ttl_ms`.
    #[must_use]
    pub fn is_expired(&self, value: &PropertyValue, ttl_ms: i64) -> bool {
        match value.write_time_ms() {
            Some(written) => self.clock.now_ms().saturating_sub(written) > ttl_ms,
            None => true,
        }
    }

    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// A page view for the page identified by `page_key` (usually its URL).
    pub fn new_page(self: &Arc<Self>, page_key: &str) -> PropertyPage {
        PropertyPage {
            key: page_key.to_string(),
            cache: Arc::clone(self),
        }
    }
}

// =============================================================================
// PAGE
// =============================================================================

/// Properties of one page, bound to the shared cache.
#[derive(Debug, Clone)]
pub struct PropertyPage {
    key: String,
    cache: Arc<PropertyCache>,
}

impl PropertyPage {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<PropertyCache> {
        &self.cache
    }

    fn property_key(&self, cohort: &Cohort, property: &str) -> PropertyKey {
        PropertyKey::new(self.key.as_str(), cohort.name(), property)
    }

    /// Read a property. Store failures are logged and read as absent.
    pub fn get_property(&self, cohort: &Cohort, property: &str) -> PropertyValue {
        match self.cache.store.get(&self.property_key(cohort, property)) {
            Ok(stored) => PropertyValue::from(stored),
            Err(e) => {
                tracing::warn!(page = %self.key, cohort = cohort.name(), property, error = %e, "Property read failed");
                PropertyValue::absent()
            }
        }
    }

    /// Write a property stamped with the current time.
    ///
    /// Empty payloads are not stored; the call returns `Ok` and leaves any
    /// previous value in place.
    pub fn update_value(&self, cohort: &Cohort, property: &str, bytes: Vec<u8>) -> Result<(), SluiceError> {
        if bytes.is_empty() {
            tracing::debug!(page = %self.key, property, "Skipping empty property write");
            return Ok(());
        }
        let stored = StoredProperty {
            bytes,
            write_time_ms: self.cache.clock.now_ms(),
        };
        self.cache.store.put(&self.property_key(cohort, property), stored)
    }
}
