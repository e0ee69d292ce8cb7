use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{JobStore, StoreError};
use crate::domain::{
    ChapterArtifact, ChapterContent, CourseSpec, GenerationJob, JobError, JobId, JobStatus,
};

/// Postgres-backed `JobStore`.
///
/// Conditional transitions are single `UPDATE ... WHERE status = ...`
/// statements, so the row-level atomicity the claim protocol needs comes
/// straight from the database.
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn query_failed(e: sqlx::Error) -> StoreError {
    StoreError::QueryFailed(e.to_string())
}

fn job_from_row(row: &PgRow) -> Result<GenerationJob, StoreError> {
    let corrupt = |msg: String| StoreError::CorruptRecord(msg);

    let id: Uuid = row.try_get("id").map_err(query_failed)?;
    let spec_json: serde_json::Value = row.try_get("spec").map_err(query_failed)?;
    let spec: CourseSpec = serde_json::from_value(spec_json)
        .map_err(|e| corrupt(format!("job {} spec: {}", id, e)))?;

    let status: String = row.try_get("status").map_err(query_failed)?;
    let status = status
        .parse::<JobStatus>()
        .map_err(|e| corrupt(format!("job {}: {}", id, e)))?;

    let error_json: Option<serde_json::Value> = row.try_get("error").map_err(query_failed)?;
    let last_error = error_json
        .map(serde_json::from_value::<JobError>)
        .transpose()
        .map_err(|e| corrupt(format!("job {} error: {}", id, e)))?;

    let current_chapter: i32 = row.try_get("current_chapter").map_err(query_failed)?;
    let completed_chapters: i32 = row.try_get("completed_chapters").map_err(query_failed)?;

    Ok(GenerationJob {
        id: JobId::from_uuid(id),
        owner_id: row.try_get("owner_id").map_err(query_failed)?,
        spec,
        status,
        current_chapter: current_chapter as u32,
        completed_chapters: completed_chapters as u32,
        claimed_by: row.try_get("claimed_by").map_err(query_failed)?,
        claimed_at: row.try_get("claimed_at").map_err(query_failed)?,
        last_heartbeat_at: row.try_get("last_heartbeat_at").map_err(query_failed)?,
        last_error,
        created_at: row.try_get("created_at").map_err(query_failed)?,
        started_at: row.try_get("started_at").map_err(query_failed)?,
        completed_at: row.try_get("completed_at").map_err(query_failed)?,
    })
}

const JOB_COLUMNS: &str = "id, owner_id, spec, status, current_chapter, completed_chapters, \
     claimed_by, claimed_at, last_heartbeat_at, error, created_at, started_at, completed_at";

#[async_trait]
impl JobStore for PgJobStore {
    #[instrument(skip(self, spec))]
    async fn create_queued(
        &self,
        spec: CourseSpec,
        owner_id: Option<String>,
    ) -> Result<JobId, StoreError> {
        let job = GenerationJob::queued(spec, owner_id);
        let spec_json = serde_json::to_value(&job.spec)
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        sqlx::query(
            "INSERT INTO generation_jobs \
             (id, owner_id, spec, status, current_chapter, completed_chapters, created_at) \
             VALUES ($1, $2, $3, $4, 0, 0, $5)",
        )
        .bind(job.id.as_uuid())
        .bind(&job.owner_id)
        .bind(spec_json)
        .bind(job.status.as_str())
        .bind(job.created_at)
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(job.id)
    }

    #[instrument(skip(self), fields(job_id = %id.as_uuid()))]
    async fn get(&self, id: JobId) -> Result<Option<GenerationJob>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM generation_jobs WHERE id = $1",
            JOB_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        row.as_ref().map(job_from_row).transpose()
    }

    async fn next_queued(&self) -> Result<Option<JobId>, StoreError> {
        let row = sqlx::query(
            "SELECT id FROM generation_jobs WHERE status = $1 ORDER BY created_at LIMIT 1",
        )
        .bind(JobStatus::Queued.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        row.map(|r| r.try_get::<Uuid, _>("id").map(JobId::from_uuid))
            .transpose()
            .map_err(query_failed)
    }

    #[instrument(skip(self), fields(job_id = %id.as_uuid()))]
    async fn claim(&self, id: JobId, worker_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE generation_jobs \
             SET status = $3, claimed_by = $2, claimed_at = now(), \
                 last_heartbeat_at = now(), started_at = COALESCE(started_at, now()) \
             WHERE id = $1 AND status = $4",
        )
        .bind(id.as_uuid())
        .bind(worker_id)
        .bind(JobStatus::Generating.as_str())
        .bind(JobStatus::Queued.as_str())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, content), fields(job_id = %id.as_uuid()))]
    async fn upsert_chapter(
        &self,
        id: JobId,
        chapter_number: u32,
        content: ChapterContent,
    ) -> Result<(), StoreError> {
        let content_json =
            serde_json::to_value(&content).map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        let mut tx = self.pool.begin().await.map_err(query_failed)?;

        sqlx::query(
            "INSERT INTO chapter_artifacts (job_id, chapter_number, content, generated_at) \
             VALUES ($1, $2, $3, now()) \
             ON CONFLICT (job_id, chapter_number) \
             DO UPDATE SET content = EXCLUDED.content, generated_at = EXCLUDED.generated_at",
        )
        .bind(id.as_uuid())
        .bind(chapter_number as i32)
        .bind(content_json)
        .execute(&mut *tx)
        .await
        .map_err(query_failed)?;

        // Recompute, don't increment.
        sqlx::query(
            "UPDATE generation_jobs \
             SET completed_chapters = \
                 (SELECT COUNT(*) FROM chapter_artifacts WHERE job_id = $1), \
                 current_chapter = GREATEST(current_chapter, $2), \
                 last_heartbeat_at = now() \
             WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(chapter_number as i32)
        .execute(&mut *tx)
        .await
        .map_err(query_failed)?;

        tx.commit().await.map_err(query_failed)
    }

    async fn chapters(&self, id: JobId) -> Result<Vec<ChapterArtifact>, StoreError> {
        let rows = sqlx::query(
            "SELECT chapter_number, content, generated_at FROM chapter_artifacts \
             WHERE job_id = $1 ORDER BY chapter_number",
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        rows.into_iter()
            .map(|row| {
                let chapter_number: i32 = row.try_get("chapter_number").map_err(query_failed)?;
                let content_json: serde_json::Value =
                    row.try_get("content").map_err(query_failed)?;
                let content: ChapterContent = serde_json::from_value(content_json)
                    .map_err(|e| StoreError::CorruptRecord(format!("chapter content: {}", e)))?;
                let generated_at: DateTime<Utc> =
                    row.try_get("generated_at").map_err(query_failed)?;
                Ok(ChapterArtifact {
                    job_id: id,
                    chapter_number: chapter_number as u32,
                    content,
                    generated_at,
                })
            })
            .collect()
    }

    #[instrument(skip(self), fields(job_id = %id.as_uuid()))]
    async fn mark_completed(&self, id: JobId) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE generation_jobs SET status = $2, completed_at = now() \
             WHERE id = $1 AND status = $3 AND completed_chapters = (spec->>'total_chapters')::int",
        )
        .bind(id.as_uuid())
        .bind(JobStatus::Completed.as_str())
        .bind(JobStatus::Generating.as_str())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, error), fields(job_id = %id.as_uuid()))]
    async fn mark_failed(
        &self,
        id: JobId,
        worker_id: &str,
        error: JobError,
    ) -> Result<bool, StoreError> {
        let error_json =
            serde_json::to_value(&error).map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE generation_jobs SET status = $2, error = $3, completed_at = now() \
             WHERE id = $1 AND status = $4 AND claimed_by = $5",
        )
        .bind(id.as_uuid())
        .bind(JobStatus::Failed.as_str())
        .bind(error_json)
        .bind(JobStatus::Generating.as_str())
        .bind(worker_id)
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), fields(job_id = %id.as_uuid()))]
    async fn cancel(&self, id: JobId) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE generation_jobs SET status = $2, completed_at = now() \
             WHERE id = $1 AND status = $3",
        )
        .bind(id.as_uuid())
        .bind(JobStatus::Cancelled.as_str())
        .bind(JobStatus::Queued.as_str())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), fields(job_id = %id.as_uuid()))]
    async fn reclaim(&self, id: JobId, stale_after: Duration) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE generation_jobs \
             SET status = $3, claimed_by = NULL, claimed_at = NULL \
             WHERE id = $1 AND status = $4 \
               AND last_heartbeat_at < now() - make_interval(secs => $2)",
        )
        .bind(id.as_uuid())
        .bind(stale_after.as_secs_f64())
        .bind(JobStatus::Queued.as_str())
        .bind(JobStatus::Generating.as_str())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(result.rows_affected() == 1)
    }

    async fn stale_generating(&self, stale_after: Duration) -> Result<Vec<JobId>, StoreError> {
        let rows = sqlx::query(
            "SELECT id FROM generation_jobs \
             WHERE status = $1 AND last_heartbeat_at < now() - make_interval(secs => $2)",
        )
        .bind(JobStatus::Generating.as_str())
        .bind(stale_after.as_secs_f64())
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        rows.into_iter()
            .map(|row| {
                row.try_get::<Uuid, _>("id")
                    .map(JobId::from_uuid)
                    .map_err(query_failed)
            })
            .collect()
    }
}
