//! Persistence contract for license records.
//!
//! Implementations must enforce key uniqueness inside
//! [`LicenseStore::insert_if_absent`] itself. The engine never checks for an
//! existing key before inserting.

use crate::error::{StoreError, StoreResult};
use crate::record::{LicenseRecord, LicenseUpdate};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::cmp::Reverse;

/// Storage backend for license records.
pub trait LicenseStore: Send + Sync {
    /// Persists `record` unless a record with the same key exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] if the key is taken, or
    /// [`StoreError::Backend`] if the backend fails.
    fn insert_if_absent(&self, record: &LicenseRecord) -> StoreResult<()>;

    /// Looks up a record by its key string.
    fn find_by_key(&self, key: &str) -> StoreResult<Option<LicenseRecord>>;

    /// Applies `update` to the record with `key` and returns the result.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no record has that key.
    fn update_fields(
        &self,
        key: &str,
        update: &LicenseUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<LicenseRecord>;

    /// Returns every record, newest first.
    fn list_all(&self) -> StoreResult<Vec<LicenseRecord>>;

    /// Checks that the backend is reachable.
    fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Volatile store keyed by license key.
#[derive(Debug, Default)]
pub struct MemoryLicenseStore {
    records: DashMap<String, LicenseRecord>,
}

impl MemoryLicenseStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl LicenseStore for MemoryLicenseStore {
    fn insert_if_absent(&self, record: &LicenseRecord) -> StoreResult<()> {
        match self.records.entry(record.key.as_str().to_string()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateKey(record.key.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    fn find_by_key(&self, key: &str) -> StoreResult<Option<LicenseRecord>> {
        Ok(self.records.get(key).map(|r| r.value().clone()))
    }

    fn update_fields(
        &self,
        key: &str,
        update: &LicenseUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<LicenseRecord> {
        let mut record = self
            .records
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        record.apply(update, now);
        Ok(record.clone())
    }

    fn list_all(&self) -> StoreResult<Vec<LicenseRecord>> {
        let mut records: Vec<LicenseRecord> =
            self.records.iter().map(|r| r.value().clone()).collect();
        // Ids are UUID v7, so they break ties between equal timestamps.
        records.sort_by_key(|r| Reverse((r.created_at, r.id)));
        Ok(records)
    }
}
