use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{ChapterArtifact, ChapterContent, CourseSpec, GenerationJob, JobError, JobId};

/// Durable record of jobs and chapter artifacts.
///
/// Every conditional operation must be atomic with respect to concurrent
/// workers and watchdogs: `claim` is the sole mechanism preventing two
/// workers from generating the same job, and `upsert_chapter` recomputes the
/// completed count rather than incrementing it so repeated writes of the same
/// chapter never inflate progress.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create_queued(
        &self,
        spec: CourseSpec,
        owner_id: Option<String>,
    ) -> Result<JobId, StoreError>;

    async fn get(&self, id: JobId) -> Result<Option<GenerationJob>, StoreError>;

    /// Oldest Queued job, if any. The job table is the queue.
    async fn next_queued(&self) -> Result<Option<JobId>, StoreError>;

    /// Conditional Queued -> Generating. Returns false when another worker
    /// already holds the claim.
    async fn claim(&self, id: JobId, worker_id: &str) -> Result<bool, StoreError>;

    /// Write or overwrite the chapter row, recompute `completed_chapters` as
    /// a distinct count, advance `current_chapter`, refresh the heartbeat.
    async fn upsert_chapter(
        &self,
        id: JobId,
        chapter_number: u32,
        content: ChapterContent,
    ) -> Result<(), StoreError>;

    /// Persisted chapters for a job, ordered by chapter number.
    async fn chapters(&self, id: JobId) -> Result<Vec<ChapterArtifact>, StoreError>;

    /// Conditional: only succeeds once `completed_chapters` equals
    /// `total_chapters`.
    async fn mark_completed(&self, id: JobId) -> Result<bool, StoreError>;

    /// Conditional terminal failure: only succeeds while the job is still
    /// Generating under `worker_id`'s claim. Returns false when the claim was
    /// revoked in the meantime, so a worker that lost its job to a reclaim
    /// cannot overwrite a terminal state another worker reached. Chapters
    /// already persisted are retained.
    async fn mark_failed(
        &self,
        id: JobId,
        worker_id: &str,
        error: JobError,
    ) -> Result<bool, StoreError>;

    /// Conditional Queued -> Cancelled; a claimed job cannot be cancelled.
    async fn cancel(&self, id: JobId) -> Result<bool, StoreError>;

    /// Watchdog only: conditional Generating -> Queued when the heartbeat is
    /// older than `stale_after`, clearing the claim.
    async fn reclaim(&self, id: JobId, stale_after: Duration) -> Result<bool, StoreError>;

    /// Generating jobs whose heartbeat is older than `stale_after`.
    async fn stale_generating(&self, stale_after: Duration) -> Result<Vec<JobId>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("corrupt record: {0}")]
    CorruptRecord(String),
}
