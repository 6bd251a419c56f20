//! In-Memory Store Module
//!
//! A process-local [`KeyValueStore`] with TTL expiry. Serves as the backend
//! for single-node development and as the fake store in tests: it can be
//! switched to "unavailable" and counts every operation it receives.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::cache::{KeyValueStore, StoredEntry};
use crate::error::{StoreError, StoreResult};

// == Memory Store ==
#[derive(Debug)]
pub struct MemoryStore {
    /// Key-value storage
    entries: Mutex<HashMap<String, StoredEntry>>,
    /// When false every operation fails with `StoreError::Unavailable`
    available: AtomicBool,
    /// Number of ping/get/set calls received
    operations: AtomicUsize,
    /// Number of set calls received
    writes: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
            operations: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Simulates the store going down or coming back.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Total calls received through [`KeyValueStore`].
    pub fn operation_count(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    /// Total `set_ex` calls received, successful or not.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Places raw bytes under `key`, bypassing availability and counters.
    ///
    /// Nothing is stored when the TTL overflows the clock.
    pub async fn insert_raw(&self, key: &str, value: Vec<u8>, ttl_seconds: u64) {
        if let Some(entry) = StoredEntry::new(value, ttl_seconds) {
            self.entries.lock().await.insert(key.to_string(), entry);
        }
    }

    /// Reads raw bytes under `key`, bypassing availability and counters.
    pub async fn peek(&self, key: &str) -> Option<Vec<u8>> {
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone())
    }

    /// Remaining lifetime of `key`, if present and unexpired.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(StoredEntry::ttl_remaining)
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were dropped.
    pub async fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        before - entries.len()
    }

    // == Length ==
    /// Number of entries held, expired ones included until cleanup.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    fn check_available(&self) -> StoreResult<()> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.check_available()
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.check_available()?;

        let mut entries = self.entries.lock().await;
        if entries.get(key).is_some_and(StoredEntry::is_expired) {
            entries.remove(key);
        }
        Ok(entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set_ex(&self, key: &str, value: &[u8], ttl_seconds: u64) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let entry = StoredEntry::new(value.to_vec(), ttl_seconds)
            .ok_or(StoreError::InvalidTtl(ttl_seconds))?;
        self.entries.lock().await.insert(key.to_string(), entry);
        Ok(())
    }
}
