use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{CourseSpec, JobError, JobStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

/// One request to produce a multi-chapter course, tracked from Queued to a
/// terminal status.
///
/// Mutated only by the worker holding the claim, except for the watchdog's
/// reclaim back to Queued. Terminal exactly once.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub id: JobId,
    pub owner_id: Option<String>,
    pub spec: CourseSpec,
    pub status: JobStatus,
    /// 0 until a worker starts chapter 1; monotonically non-decreasing.
    pub current_chapter: u32,
    /// Count of distinct persisted chapters, recomputed on every upsert.
    pub completed_chapters: u32,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub last_heartbeat_at: Option<DateTime<Utc>>,
    pub last_error: Option<JobError>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl GenerationJob {
    pub fn queued(spec: CourseSpec, owner_id: Option<String>) -> Self {
        Self {
            id: JobId::new(),
            owner_id,
            spec,
            status: JobStatus::Queued,
            current_chapter: 0,
            completed_chapters: 0,
            claimed_by: None,
            claimed_at: None,
            last_heartbeat_at: None,
            last_error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn total_chapters(&self) -> u32 {
        self.spec.total_chapters
    }
}
