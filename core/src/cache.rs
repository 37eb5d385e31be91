//! Last-known-good response storage keyed by request fingerprint.
//!
//! # Design
//! `CacheStore` is the persistence boundary: raw bytes in, raw bytes out,
//! addressed by the fingerprint string. Capacity limits belong to the store.
//! `ResponseCache` wraps a store for the coordinator and turns store failures
//! into log lines; a broken cache never fails a request.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::error::StoreError;
use crate::request::Fingerprint;

pub trait CacheStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Overwrites any previous value; concurrent writers are last-write-wins.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}

/// In-process store, lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Durable store backed by a sled database.
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open with sled's page cache bounded to `capacity_bytes`.
    pub fn open_with_capacity(path: impl AsRef<Path>, capacity_bytes: u64) -> Result<Self, StoreError> {
        let db = sled::Config::new()
            .path(path)
            .cache_capacity(capacity_bytes)
            .open()?;
        Ok(Self { db })
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}

impl CacheStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.db.insert(key, value)?;
        Ok(())
    }
}

/// The coordinator's view of a `CacheStore`.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Vec<u8>> {
        match self.store.get(fingerprint.as_str()) {
            Ok(hit) => hit,
            Err(e) => {
                warn!(%fingerprint, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    pub fn put(&self, fingerprint: &Fingerprint, bytes: &[u8]) {
        match self.store.put(fingerprint.as_str(), bytes) {
            Ok(()) => debug!(%fingerprint, bytes = bytes.len(), "cached response"),
            Err(e) => warn!(%fingerprint, error = %e, "cache write failed"),
        }
    }
}
