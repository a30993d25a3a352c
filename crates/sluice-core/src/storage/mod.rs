//! # Storage Module
//!
//! Persistent property store backends.

pub mod redb_store;

pub use redb_store::RedbPropertyStore;
