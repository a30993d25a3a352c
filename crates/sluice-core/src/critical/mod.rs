//! # Critical Resources
//!
//! Per-page sets of resources needed for above-the-fold rendering, cached in
//! the property store and memoized per request.

pub mod finder;
pub mod record;

pub use finder::CriticalResourceFinder;
pub use record::CriticalResourceRecord;
