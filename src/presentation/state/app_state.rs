use std::sync::Arc;

use crate::application::ports::JobStore;
use crate::application::services::{ProgressReporter, RateLimiter};
use crate::presentation::config::RateLimitSettings;

/// Shared handler state. Every port is behind an `Arc<dyn _>`, so the same
/// state type serves the Postgres wiring, scaffold mode, and the test suite.
#[derive(Clone)]
pub struct AppState {
    pub job_store: Arc<dyn JobStore>,
    pub rate_limiter: Arc<RateLimiter>,
    pub progress_reporter: Arc<ProgressReporter>,
    pub rate_limit: RateLimitSettings,
}

impl AppState {
    pub fn new(
        job_store: Arc<dyn JobStore>,
        rate_limiter: Arc<RateLimiter>,
        rate_limit: RateLimitSettings,
    ) -> Self {
        let progress_reporter = Arc::new(ProgressReporter::new(Arc::clone(&job_store)));
        Self {
            job_store,
            rate_limiter,
            progress_reporter,
            rate_limit,
        }
    }
}
