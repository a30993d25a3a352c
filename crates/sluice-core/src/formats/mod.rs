//! # Formats Module
//!
//! Byte-level encodings of cached values. Pure transformations; store I/O
//! lives with the property cache.

pub mod critical;

pub use critical::{record_from_bytes, record_from_payload, record_to_bytes, record_to_payload};
