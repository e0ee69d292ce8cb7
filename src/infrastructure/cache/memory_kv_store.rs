use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::application::ports::{KeyValueStore, KeyValueStoreError};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-memory key/value store with TTL entries and lazy expiry.
///
/// Counters and their expiration are mutated under one lock, which gives the
/// rate limiter the atomic increment-with-initial-TTL the fixed window needs.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop expired entries eagerly; returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        before - entries.len()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn increment(
        &self,
        key: &str,
        initial_ttl: Duration,
    ) -> Result<i64, KeyValueStoreError> {
        let mut entries = self.lock();

        let live = entries.get(key).filter(|e| !e.is_expired());
        let count = match live {
            Some(entry) => {
                let current: i64 = entry
                    .value
                    .parse()
                    .map_err(|_| KeyValueStoreError::NotACounter(key.to_string()))?;
                let next = current + 1;
                let expires_at = entry.expires_at;
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: next.to_string(),
                        expires_at,
                    },
                );
                next
            }
            None => {
                // First increment of a window: the TTL is fixed here and
                // never refreshed by later increments.
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: "1".to_string(),
                        expires_at: Some(Instant::now() + initial_ttl),
                    },
                );
                1
            }
        };

        Ok(count)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, KeyValueStoreError> {
        let entries = self.lock();
        Ok(entries
            .get(key)
            .filter(|e| !e.is_expired())
            .and_then(|e| e.expires_at)
            .map(|at| at.saturating_duration_since(Instant::now())))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        let entries = self.lock();
        Ok(entries
            .get(key)
            .filter(|e| !e.is_expired())
            .map(|e| e.value.clone()))
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), KeyValueStoreError> {
        let mut entries = self.lock();
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: ttl.map(|t| Instant::now() + t),
            },
        );
        Ok(())
    }

    async fn delete_prefixed(&self, prefix: &str) -> Result<u64, KeyValueStoreError> {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }
}
