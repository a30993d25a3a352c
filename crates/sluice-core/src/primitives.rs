//! # Fixed Primitives
//!
//! Compiled-in constants for the decision layer. These are immutable at
//! runtime; configuration may override the option defaults per scope, never
//! the constants themselves.

// =============================================================================
// CRITICAL RESOURCE STORAGE
// =============================================================================

/// Property name under which the critical-resource record is stored.
pub const CRITICAL_RESOURCES_PROPERTY: &str = "critical_resources";

/// Cohort the critical-resource property lives in unless configured otherwise.
pub const DEFAULT_CRITICAL_COHORT: &str = "dom";

/// Stored in place of an empty record.
///
/// Property stores refuse empty payloads, and an empty record encodes to
/// zero bytes. Writing this marker instead keeps "computed but empty"
/// distinguishable from "never computed".
pub const EMPTY_VALUE_PLACEHOLDER: &[u8] = b"\n";

/// Maximum encoded size of a critical-resource record.
///
/// Checked before decoding and after encoding; oversized payloads are
/// treated as undecodable on read and as a serialization failure on write.
pub const MAX_CRITICAL_PAYLOAD_SIZE: usize = 1024 * 1024; // 1 MB

// =============================================================================
// STATISTICS NAMES
// =============================================================================

/// Lookups that found a record within its TTL.
pub const CRITICAL_RESOURCES_VALID_COUNT: &str = "critical_resources_valid_count";

/// Lookups that found a record older than its TTL.
pub const CRITICAL_RESOURCES_EXPIRED_COUNT: &str = "critical_resources_expired_count";

/// Lookups that found nothing usable.
pub const CRITICAL_RESOURCES_NOT_FOUND_COUNT: &str = "critical_resources_not_found_count";

// =============================================================================
// OPTION DEFAULTS
// =============================================================================

pub const DEFAULT_CSS_INLINE_MAX_BYTES: i64 = 2048;
pub const DEFAULT_IMAGE_INLINE_MAX_BYTES: i64 = 2048;
pub const DEFAULT_JS_INLINE_MAX_BYTES: i64 = 2048;
/// Outlining starts where inlining stops.
pub const DEFAULT_CSS_OUTLINE_MIN_BYTES: i64 = DEFAULT_CSS_INLINE_MAX_BYTES;
pub const DEFAULT_JS_OUTLINE_MIN_BYTES: i64 = DEFAULT_JS_INLINE_MAX_BYTES;
pub const DEFAULT_HTML_CACHE_TIME_MS: i64 = 0;

/// Limit on concurrent image rewrites.
pub const DEFAULT_IMAGE_MAX_REWRITES_AT_ONCE: i64 = 8;

/// Browsers cap total URL length near 2k characters.
pub const MAX_URL_SIZE: i64 = 2083;

/// Per path-segment limit imposed by common web servers.
pub const DEFAULT_MAX_URL_SEGMENT_SIZE: i64 = 1024;

pub const DEFAULT_BEACON_URL: &str = "/mod_pagespeed_beacon?ets=";

/// TTL applied to finder properties such as critical resources (2 hours).
pub const DEFAULT_FINDER_PROPERTIES_CACHE_EXPIRATION_MS: i64 = 2 * 60 * 60 * 1000;

/// Sentinel meaning "no cache invalidation timestamp configured".
pub const CACHE_INVALIDATION_TIMESTAMP_UNSET: i64 = -1;
