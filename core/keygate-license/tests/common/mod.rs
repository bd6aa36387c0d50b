//! Shared test helpers for license tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use keygate_license::{
    LicenseEngine, LicenseRecord, LicenseStore, LicenseUpdate, MemoryLicenseStore, StoreError,
    StoreResult,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// 2024-01-01T00:00:00Z.
pub fn new_year_2024() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Returns an engine over a fresh in-memory store, plus the store itself.
pub fn memory_engine() -> (LicenseEngine, Arc<MemoryLicenseStore>) {
    let store = Arc::new(MemoryLicenseStore::new());
    let engine = LicenseEngine::new(store.clone());
    (engine, store)
}

/// A store that reports `DuplicateKey` for the first `collisions` inserts.
pub struct CollidingStore {
    inner: MemoryLicenseStore,
    collisions: u32,
    pub attempts: AtomicU32,
}

impl CollidingStore {
    pub fn new(collisions: u32) -> Self {
        Self {
            inner: MemoryLicenseStore::new(),
            collisions,
            attempts: AtomicU32::new(0),
        }
    }
}

impl LicenseStore for CollidingStore {
    fn insert_if_absent(&self, record: &LicenseRecord) -> StoreResult<()> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst);
        if n < self.collisions {
            return Err(StoreError::DuplicateKey(record.key.to_string()));
        }
        self.inner.insert_if_absent(record)
    }

    fn find_by_key(&self, key: &str) -> StoreResult<Option<LicenseRecord>> {
        self.inner.find_by_key(key)
    }

    fn update_fields(
        &self,
        key: &str,
        update: &LicenseUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<LicenseRecord> {
        self.inner.update_fields(key, update, now)
    }

    fn list_all(&self) -> StoreResult<Vec<LicenseRecord>> {
        self.inner.list_all()
    }
}

/// A store whose backend is always down.
pub struct BrokenStore;

impl LicenseStore for BrokenStore {
    fn insert_if_absent(&self, _record: &LicenseRecord) -> StoreResult<()> {
        Err(StoreError::Backend("connection refused".into()))
    }

    fn find_by_key(&self, _key: &str) -> StoreResult<Option<LicenseRecord>> {
        Err(StoreError::Backend("connection refused".into()))
    }

    fn update_fields(
        &self,
        _key: &str,
        _update: &LicenseUpdate,
        _now: DateTime<Utc>,
    ) -> StoreResult<LicenseRecord> {
        Err(StoreError::Backend("connection refused".into()))
    }

    fn list_all(&self) -> StoreResult<Vec<LicenseRecord>> {
        Err(StoreError::Backend("connection refused".into()))
    }

    fn ping(&self) -> StoreResult<()> {
        Err(StoreError::Backend("connection refused".into()))
    }
}
