use std::time::Duration;

use async_trait::async_trait;

/// Key/value store with atomic increment and expiration, used by the rate
/// limiter and response caching.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Atomically increment the counter at `key` and return the new count.
    /// When the increment creates the key, `initial_ttl` is applied in the
    /// same atomic step; an existing key's TTL is left untouched, so the
    /// window length is fixed regardless of request rate.
    async fn increment(&self, key: &str, initial_ttl: Duration)
        -> Result<i64, KeyValueStoreError>;

    /// Remaining time to live, or None when the key is absent or persistent.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, KeyValueStoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError>;

    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), KeyValueStoreError>;

    /// Delete every key starting with `prefix`; returns the number removed.
    async fn delete_prefixed(&self, prefix: &str) -> Result<u64, KeyValueStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum KeyValueStoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("value at {0} is not a counter")]
    NotACounter(String),
}
