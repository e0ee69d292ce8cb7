use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{KeyValueStore, KeyValueStoreError};

const SUBMIT_KEY_PREFIX: &str = "ratelimit:submit:";

#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// Remaining window time when denied.
    pub retry_after: Option<Duration>,
}

/// Fixed-window submission gate, one live counter per caller identity.
///
/// The counter key carries no time-bucket suffix; the window is enforced by
/// the TTL set together with the first increment, so a burst of concurrent
/// first-requests can neither strand the key without expiry nor keep
/// resetting the window.
pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self), fields(identifier = %identifier))]
    pub async fn allow(
        &self,
        identifier: &str,
        limit: u32,
        window: Duration,
    ) -> Result<RateLimitDecision, KeyValueStoreError> {
        let key = format!("{}{}", SUBMIT_KEY_PREFIX, identifier);
        let count = self.store.increment(&key, window).await?;

        let allowed = count <= i64::from(limit);
        let remaining = (i64::from(limit) - count).max(0) as u32;
        let retry_after = if allowed {
            None
        } else {
            self.store.ttl(&key).await?
        };

        if !allowed {
            tracing::warn!(count, limit, "Submission rate limit exceeded");
        }

        Ok(RateLimitDecision {
            allowed,
            remaining,
            retry_after,
        })
    }

    /// Drop every submission counter. Operational escape hatch.
    pub async fn reset_all(&self) -> Result<u64, KeyValueStoreError> {
        self.store.delete_prefixed(SUBMIT_KEY_PREFIX).await
    }
}
