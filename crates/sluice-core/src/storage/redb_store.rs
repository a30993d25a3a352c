//! # redb-backed Property Store
//!
//! A disk-backed [`PropertyStore`] using the redb embedded database.
//!
//! One table keyed by `(page, cohort, property)`; each value is a
//! postcard-encoded [`StoredProperty`]. Every `put` is its own write
//! transaction, so a single-key write is atomic and durable. redb's MVCC
//! lets readers proceed while a writer commits.

use crate::SluiceError;
use crate::property::{PropertyKey, PropertyStore, StoredProperty};
use redb::{Database, ReadableDatabase, ReadableTableMetadata, TableDefinition};
use std::path::Path;

/// Table for properties: (page, cohort, property) -> serialized StoredProperty
const PROPERTIES: TableDefinition<(&str, &str, &str), &[u8]> = TableDefinition::new("properties");

pub struct RedbPropertyStore {
    db: Database,
}

impl std::fmt::Debug for RedbPropertyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbPropertyStore").finish_non_exhaustive()
    }
}

impl RedbPropertyStore {
    /// Open or create a property database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SluiceError> {
        let db =
            Database::create(path.as_ref()).map_err(|e| SluiceError::IoError(e.to_string()))?;

        // Initialize the table if it doesn't exist
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| SluiceError::IoError(e.to_string()))?;
            let _ = write_txn
                .open_table(PROPERTIES)
                .map_err(|e| SluiceError::IoError(e.to_string()))?;
            write_txn
                .commit()
                .map_err(|e| SluiceError::IoError(e.to_string()))?;
        }

        Ok(Self { db })
    }

    /// Number of stored properties.
    pub fn len(&self) -> Result<u64, SluiceError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| SluiceError::StorageError(e.to_string()))?;
        let table = read_txn
            .open_table(PROPERTIES)
            .map_err(|e| SluiceError::StorageError(e.to_string()))?;
        table
            .len()
            .map_err(|e| SluiceError::StorageError(e.to_string()))
    }

    pub fn is_empty(&self) -> Result<bool, SluiceError> {
        self.len().map(|n| n == 0)
    }
}

impl PropertyStore for RedbPropertyStore {
    fn get(&self, key: &PropertyKey) -> Result<Option<StoredProperty>, SluiceError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| SluiceError::StorageError(e.to_string()))?;
        let table = read_txn
            .open_table(PROPERTIES)
            .map_err(|e| SluiceError::StorageError(e.to_string()))?;

        let entry = table
            .get((key.page.as_str(), key.cohort.as_str(), key.property.as_str()))
            .map_err(|e| SluiceError::StorageError(e.to_string()))?;
        match entry {
            Some(guard) => {
                let stored: StoredProperty = postcard::from_bytes(guard.value())
                    .map_err(|e| SluiceError::DeserializationError(e.to_string()))?;
                Ok(Some(stored))
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &PropertyKey, value: StoredProperty) -> Result<(), SluiceError> {
        let bytes = postcard::to_stdvec(&value)
            .map_err(|e| SluiceError::SerializationError(e.to_string()))?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| SluiceError::StorageError(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(PROPERTIES)
                .map_err(|e| SluiceError::StorageError(e.to_string()))?;
            table
                .insert(
                    (key.page.as_str(), key.cohort.as_str(), key.property.as_str()),
                    bytes.as_slice(),
                )
                .map_err(|e| SluiceError::StorageError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| SluiceError::StorageError(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn basic_operations() {
        let temp = tempdir().expect("temp dir");
        let store = RedbPropertyStore::open(temp.path().join("test.redb")).expect("open db");
        let key = PropertyKey::new("http://a.com/", "dom", "critical_resources");

        assert!(store.get(&key).expect("get").is_none());
        store
            .put(&key, StoredProperty { bytes: b"payload".to_vec(), write_time_ms: 42 })
            .expect("put");

        let stored = store.get(&key).expect("get").expect("present");
        assert_eq!(stored.bytes, b"payload");
        assert_eq!(stored.write_time_ms, 42);
        assert_eq!(store.len().expect("len"), 1);
    }

    #[test]
    fn key_components_are_distinct() {
        let temp = tempdir().expect("temp dir");
        let store = RedbPropertyStore::open(temp.path().join("test.redb")).expect("open db");
        store
            .put(
                &PropertyKey::new("p", "dom", "x"),
                StoredProperty { bytes: b"1".to_vec(), write_time_ms: 0 },
            )
            .expect("put");

        assert!(store.get(&PropertyKey::new("p", "beacon", "x")).expect("get").is_none());
        assert!(store.get(&PropertyKey::new("q", "dom", "x")).expect("get").is_none());
    }

    #[test]
    fn persistence() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");
        let key = PropertyKey::new("p", "dom", "x");
        {
            let store = RedbPropertyStore::open(&db_path).expect("open db");
            store
                .put(&key, StoredProperty { bytes: b"kept".to_vec(), write_time_ms: 7 })
                .expect("put");
        }

        let store = RedbPropertyStore::open(&db_path).expect("reopen db");
        assert_eq!(store.get(&key).expect("get").expect("present").bytes, b"kept");
    }
}
