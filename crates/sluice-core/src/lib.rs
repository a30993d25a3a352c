//! # sluice-core
//!
//! The decision layer of an HTML rewriting pipeline.
//!
//! This crate answers two questions per request:
//! - which rewrite filters apply, given layered configuration scopes
//!   (global, per-host, per-request)
//! - which resources are critical for the page, from a TTL-checked
//!   property cache, computed at most once per request
//!
//! ## Architectural Constraints
//!
//! - Has NO async, NO network dependencies (pure Rust)
//! - Filter tables are built once and never mutated
//! - A `RewriteOptions` snapshot is mutated while privately owned and is
//!   read-only once shared
//! - Property stores are collaborators behind the `PropertyStore` trait;
//!   all calls to them may block
//! - The three lookup counters are the only cross-thread mutable state

// =============================================================================
// MODULES
// =============================================================================

pub mod config;
pub mod critical;
pub mod filters;
pub mod formats;
pub mod options;
pub mod primitives;
pub mod property;
pub mod request;
pub mod scheduler;
pub mod stats;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    CollectingMessageHandler, CriticalContext, MessageHandler, Severity, SluiceError,
    TracingMessageHandler,
};

// =============================================================================
// RE-EXPORTS: Filter Configuration
// =============================================================================

pub use config::{ResourceRule, ScopeConfig, ServerConfig, SluiceConfig, StoreConfig};
pub use filters::{Filter, FilterCatalog, FilterSet, RewriteLevel};
pub use options::{
    DomainLawyer, FileLoadPolicy, MergePolicy, OptionName, OptionType, RewriteOptions,
    ScalarValue, WildcardGroup,
};

// =============================================================================
// RE-EXPORTS: Critical Resources
// =============================================================================

pub use critical::{CriticalResourceFinder, CriticalResourceRecord};
pub use property::{
    Clock, Cohort, MemoryPropertyStore, MockClock, PropertyCache, PropertyKey, PropertyPage,
    PropertyStore, PropertyValue, StoredProperty, SystemClock,
};
pub use request::{CacheStatus, CriticalResourceInfo, RequestContext, RequestLog};
pub use stats::{Statistics, Variable};
pub use storage::RedbPropertyStore;

// =============================================================================
// RE-EXPORTS: Scheduler
// =============================================================================

pub use scheduler::{AlarmCallback, AlarmId, DeferredCleanup, Scheduler, SchedulerShutdown, SchedulerThread};
