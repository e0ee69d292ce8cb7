use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::ports::{JobStore, StoreError};
use crate::domain::{JobError, JobId, JobStatus};

/// Read-only projection over the job store for status polling.
pub struct ProgressReporter {
    store: Arc<dyn JobStore>,
}

#[derive(Debug, Clone)]
pub struct JobProgress {
    pub job_id: JobId,
    pub status: JobStatus,
    pub current_chapter: u32,
    pub total_chapters: u32,
    pub completed_chapters: u32,
    pub percentage: u8,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<JobError>,
}

impl JobProgress {
    /// Terminal progress is immutable and safe to cache; anything else
    /// changes every chapter and must not be.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

impl ProgressReporter {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self), fields(job_id = %id.as_uuid()))]
    pub async fn get_progress(&self, id: JobId) -> Result<JobProgress, ProgressError> {
        let job = self
            .store
            .get(id)
            .await?
            .ok_or(ProgressError::NotFound(id))?;

        let total = job.total_chapters();
        let percentage =
            ((f64::from(job.completed_chapters) / f64::from(total)) * 100.0).round() as u8;

        Ok(JobProgress {
            job_id: job.id,
            status: job.status,
            current_chapter: job.current_chapter,
            total_chapters: total,
            completed_chapters: job.completed_chapters,
            percentage,
            started_at: job.started_at,
            completed_at: job.completed_at,
            error: job.last_error,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("job not found: {}", .0.as_uuid())]
    NotFound(JobId),
    #[error("store: {0}")]
    Store(#[from] StoreError),
}
