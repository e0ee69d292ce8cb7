use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::application::ports::{JobStore, StoreError};

/// Periodically returns jobs abandoned by a crashed or hung worker to the
/// queue. The only actor allowed to revoke a claim, and only after the
/// worker's heartbeat has gone stale.
pub struct Watchdog {
    store: Arc<dyn JobStore>,
    stale_after: Duration,
    scan_interval: Duration,
}

impl Watchdog {
    pub fn new(store: Arc<dyn JobStore>, stale_after: Duration, scan_interval: Duration) -> Self {
        Self {
            store,
            stale_after,
            scan_interval,
        }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            stale_after_secs = self.stale_after.as_secs(),
            "Watchdog started"
        );
        let mut tick = tokio::time::interval(self.scan_interval);
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if let Err(e) = self.run_once().await {
                        tracing::error!(error = %e, "Watchdog scan failed");
                    }
                }
                _ = shutdown.changed() => {
                    tracing::info!("Watchdog stopped");
                    return;
                }
            }
        }
    }

    /// One scan pass; returns how many jobs were reclaimed.
    pub async fn run_once(&self) -> Result<usize, StoreError> {
        let stale = self.store.stale_generating(self.stale_after).await?;
        let mut reclaimed = 0;

        for job_id in stale {
            // The reclaim re-checks staleness inside the store, so a worker
            // that heartbeats between scan and reclaim keeps its claim.
            if self.store.reclaim(job_id, self.stale_after).await? {
                tracing::warn!(job_id = %job_id.as_uuid(), "Reclaimed stale job");
                reclaimed += 1;
            }
        }

        if reclaimed > 0 {
            tracing::info!(reclaimed, "Watchdog returned stale jobs to queue");
        }
        Ok(reclaimed)
    }
}
