use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::Instrument;

use crate::application::ports::{ContentProvider, ContentProviderError, JobStore, StoreError};
use crate::domain::{GenerationJob, JobError, JobId};

/// Background worker that claims queued jobs and drives the chapter pipeline.
///
/// Several dispatchers may run concurrently, each with its own `worker_id`;
/// the store's conditional claim keeps any job on exactly one of them. Within
/// a job, chapters are generated strictly one at a time.
pub struct JobDispatcher {
    store: Arc<dyn JobStore>,
    provider: Arc<dyn ContentProvider>,
    worker_id: String,
    poll_interval: Duration,
}

impl JobDispatcher {
    pub fn new(
        store: Arc<dyn JobStore>,
        provider: Arc<dyn ContentProvider>,
        worker_id: String,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            provider,
            worker_id,
            poll_interval,
        }
    }

    /// Poll until the shutdown signal flips. Each tick drains the queue.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(worker_id = %self.worker_id, "Dispatcher started");
        let mut tick = tokio::time::interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = tick.tick() => loop {
                    match self.run_once().await {
                        Ok(true) => {
                            // Re-check the signal between jobs so a busy
                            // queue cannot hold up shutdown until it drains.
                            if shutdown.has_changed().unwrap_or(true) {
                                break;
                            }
                        }
                        Ok(false) => break,
                        Err(e) => {
                            tracing::error!(error = %e, "Dispatch cycle failed");
                            break;
                        }
                    }
                },
                _ = shutdown.changed() => {
                    tracing::info!(worker_id = %self.worker_id, "Dispatcher stopped");
                    return;
                }
            }
        }
    }

    /// Claim and process at most one job. Returns false when the queue is
    /// empty or another worker won the claim.
    pub async fn run_once(&self) -> Result<bool, DispatchError> {
        let Some(job_id) = self.store.next_queued().await? else {
            return Ok(false);
        };

        if !self.store.claim(job_id, &self.worker_id).await? {
            // Claim conflict is routine under concurrent dispatchers.
            tracing::debug!(job_id = %job_id.as_uuid(), "Claim lost to another worker");
            return Ok(false);
        }

        let job = self
            .store
            .get(job_id)
            .await?
            .ok_or_else(|| DispatchError::JobVanished(job_id))?;

        let span = tracing::info_span!(
            "generation_job",
            job_id = %job_id.as_uuid(),
            worker_id = %self.worker_id,
            total_chapters = job.total_chapters(),
        );

        self.run_pipeline(&job).instrument(span).await?;
        Ok(true)
    }

    /// Generate chapters from the resume point onward. A reclaimed job picks
    /// up at `current_chapter + 1`, never from chapter 1; the chapters
    /// already checkpointed stay as they are.
    async fn run_pipeline(&self, job: &GenerationJob) -> Result<(), DispatchError> {
        let first = job.current_chapter + 1;
        let total = job.total_chapters();

        for chapter_number in first..=total {
            let topic = job.spec.topic_for_chapter(chapter_number);
            tracing::debug!(chapter_number, topic = %topic, "Generating chapter");

            match self
                .provider
                .generate_chapter(&job.spec, topic, chapter_number)
                .await
            {
                Ok(content) => {
                    self.store
                        .upsert_chapter(job.id, chapter_number, content)
                        .await?;
                }
                Err(e) => {
                    // Fail fast: no retry, no skip-ahead. Chapters 1..k-1
                    // remain in storage.
                    tracing::warn!(
                        chapter_number,
                        error = %e,
                        "Chapter generation failed, failing job"
                    );
                    let recorded = self
                        .store
                        .mark_failed(job.id, &self.worker_id, chapter_error(&e, chapter_number))
                        .await?;
                    if !recorded {
                        // Our claim was revoked mid-pipeline; whoever holds
                        // the job now owns its final state.
                        tracing::warn!("Failure not recorded, claim no longer held");
                    }
                    return Ok(());
                }
            }
        }

        if self.store.mark_completed(job.id).await? {
            tracing::info!("Job completed");
        } else {
            // Completion is conditional on the recomputed count; a false here
            // means the store and pipeline disagree about progress.
            tracing::error!("Completion rejected by store despite finished pipeline");
        }
        Ok(())
    }
}

fn chapter_error(e: &ContentProviderError, chapter_number: u32) -> JobError {
    JobError {
        kind: e.kind(),
        message: e.to_string(),
        failed_at_chapter: chapter_number,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("store: {0}")]
    Store(#[from] StoreError),
    #[error("claimed job {} no longer exists", .0.as_uuid())]
    JobVanished(JobId),
}
