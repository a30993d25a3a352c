//! In-memory property store.

use super::{PropertyKey, PropertyStore, StoredProperty};
use crate::SluiceError;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// `BTreeMap` behind an `RwLock`. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryPropertyStore {
    entries: RwLock<BTreeMap<PropertyKey, StoredProperty>>,
}

impl MemoryPropertyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored properties.
    pub fn len(&self) -> Result<usize, SluiceError> {
        self.entries
            .read()
            .map(|entries| entries.len())
            .map_err(|_| SluiceError::StorageError("memory store lock poisoned".to_string()))
    }

    pub fn is_empty(&self) -> Result<bool, SluiceError> {
        self.len().map(|n| n == 0)
    }
}

impl PropertyStore for MemoryPropertyStore {
    fn get(&self, key: &PropertyKey) -> Result<Option<StoredProperty>, SluiceError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| SluiceError::StorageError("memory store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &PropertyKey, value: StoredProperty) -> Result<(), SluiceError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| SluiceError::StorageError("memory store lock poisoned".to_string()))?;
        entries.insert(key.clone(), value);
        Ok(())
    }
}
