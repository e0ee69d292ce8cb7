use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};

use crate::application::ports::{JobStore, StoreError};
use crate::domain::{
    ChapterArtifact, ChapterContent, CourseSpec, GenerationJob, JobError, JobId, JobStatus,
};

#[derive(Default)]
struct Inner {
    jobs: HashMap<JobId, GenerationJob>,
    chapters: HashMap<JobId, BTreeMap<u32, ChapterArtifact>>,
}

/// In-memory `JobStore` used by scaffold mode and the test suite.
///
/// Every operation runs inside one mutex-guarded critical section, which is
/// what makes claim and upsert atomic against concurrent workers here.
#[derive(Default)]
pub struct MemoryJobStore {
    inner: Mutex<Inner>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn stale_before(stale_after: Duration) -> TimeDelta {
    TimeDelta::from_std(stale_after).unwrap_or(TimeDelta::MAX)
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create_queued(
        &self,
        spec: CourseSpec,
        owner_id: Option<String>,
    ) -> Result<JobId, StoreError> {
        let job = GenerationJob::queued(spec, owner_id);
        let id = job.id;
        self.lock().jobs.insert(id, job);
        Ok(id)
    }

    async fn get(&self, id: JobId) -> Result<Option<GenerationJob>, StoreError> {
        Ok(self.lock().jobs.get(&id).cloned())
    }

    async fn next_queued(&self) -> Result<Option<JobId>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::Queued)
            .min_by_key(|j| j.created_at)
            .map(|j| j.id))
    }

    async fn claim(&self, id: JobId, worker_id: &str) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let Some(job) = inner.jobs.get_mut(&id) else {
            return Ok(false);
        };
        if job.status != JobStatus::Queued {
            return Ok(false);
        }

        let now = Utc::now();
        job.status = JobStatus::Generating;
        job.claimed_by = Some(worker_id.to_string());
        job.claimed_at = Some(now);
        job.last_heartbeat_at = Some(now);
        job.started_at.get_or_insert(now);
        Ok(true)
    }

    async fn upsert_chapter(
        &self,
        id: JobId,
        chapter_number: u32,
        content: ChapterContent,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if !inner.jobs.contains_key(&id) {
            return Err(StoreError::NotFound(id.as_uuid().to_string()));
        }

        let artifact = ChapterArtifact::new(id, chapter_number, content);
        let rows = inner.chapters.entry(id).or_default();
        rows.insert(chapter_number, artifact);
        // Distinct count, not an increment: re-upserting chapter k must not
        // inflate progress.
        let completed = rows.len() as u32;

        let Some(job) = inner.jobs.get_mut(&id) else {
            return Err(StoreError::NotFound(id.as_uuid().to_string()));
        };
        job.completed_chapters = completed;
        job.current_chapter = job.current_chapter.max(chapter_number);
        job.last_heartbeat_at = Some(Utc::now());
        Ok(())
    }

    async fn chapters(&self, id: JobId) -> Result<Vec<ChapterArtifact>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .chapters
            .get(&id)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn mark_completed(&self, id: JobId) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let Some(job) = inner.jobs.get_mut(&id) else {
            return Err(StoreError::NotFound(id.as_uuid().to_string()));
        };
        if job.status != JobStatus::Generating
            || job.completed_chapters != job.spec.total_chapters
        {
            return Ok(false);
        }
        job.status = JobStatus::Completed;
        job.completed_at = Some(Utc::now());
        Ok(true)
    }

    async fn mark_failed(
        &self,
        id: JobId,
        worker_id: &str,
        error: JobError,
    ) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let Some(job) = inner.jobs.get_mut(&id) else {
            return Err(StoreError::NotFound(id.as_uuid().to_string()));
        };
        // A worker whose claim was revoked must not touch a job that has
        // since been reclaimed or reached a terminal state.
        if job.status != JobStatus::Generating || job.claimed_by.as_deref() != Some(worker_id) {
            return Ok(false);
        }
        job.status = JobStatus::Failed;
        job.last_error = Some(error);
        job.completed_at = Some(Utc::now());
        Ok(true)
    }

    async fn cancel(&self, id: JobId) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let Some(job) = inner.jobs.get_mut(&id) else {
            return Err(StoreError::NotFound(id.as_uuid().to_string()));
        };
        if job.status != JobStatus::Queued {
            return Ok(false);
        }
        job.status = JobStatus::Cancelled;
        job.completed_at = Some(Utc::now());
        Ok(true)
    }

    async fn reclaim(&self, id: JobId, stale_after: Duration) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let Some(job) = inner.jobs.get_mut(&id) else {
            return Ok(false);
        };
        if job.status != JobStatus::Generating {
            return Ok(false);
        }
        let stale = match job.last_heartbeat_at {
            Some(hb) => Utc::now() - hb > stale_before(stale_after),
            None => true,
        };
        if !stale {
            return Ok(false);
        }

        job.status = JobStatus::Queued;
        job.claimed_by = None;
        job.claimed_at = None;
        Ok(true)
    }

    async fn stale_generating(&self, stale_after: Duration) -> Result<Vec<JobId>, StoreError> {
        let threshold = stale_before(stale_after);
        let now = Utc::now();
        let inner = self.lock();
        Ok(inner
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::Generating)
            .filter(|j| match j.last_heartbeat_at {
                Some(hb) => now - hb > threshold,
                None => true,
            })
            .map(|j| j.id)
            .collect())
    }
}
