use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::application::services::{JobProgress, ProgressError};
use crate::domain::{GenerationErrorKind, JobId};
use crate::presentation::state::AppState;

/// Terminal progress never changes; let pollers cache it for an hour.
const CACHE_TERMINAL: &str = "public, max-age=3600";
const CACHE_IN_FLIGHT: &str = "no-store";

#[derive(Serialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: String,
    pub progress: ProgressBody,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub error: Option<JobErrorBody>,
}

#[derive(Serialize)]
pub struct ProgressBody {
    pub current: u32,
    pub total: u32,
    pub percentage: u8,
}

#[derive(Serialize)]
pub struct JobErrorBody {
    pub kind: GenerationErrorKind,
    pub message: String,
    pub failed_at_chapter: u32,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[tracing::instrument(skip(state))]
pub async fn job_status_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    let uuid = match Uuid::parse_str(&job_id) {
        Ok(u) => u,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Invalid job ID: {}", job_id),
                }),
            )
                .into_response();
        }
    };

    match state
        .progress_reporter
        .get_progress(JobId::from_uuid(uuid))
        .await
    {
        Ok(progress) => {
            let cache_control = if progress.is_terminal() {
                CACHE_TERMINAL
            } else {
                CACHE_IN_FLIGHT
            };
            (
                StatusCode::OK,
                [("cache-control", cache_control)],
                Json(status_body(progress)),
            )
                .into_response()
        }
        Err(ProgressError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Job not found: {}", job_id),
            }),
        )
            .into_response(),
        Err(ProgressError::Store(e)) => {
            tracing::error!(error = %e, "Failed to fetch job progress");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to fetch job: {}", e),
                }),
            )
                .into_response()
        }
    }
}

fn status_body(progress: JobProgress) -> JobStatusResponse {
    JobStatusResponse {
        job_id: progress.job_id.as_uuid().to_string(),
        status: progress.status.as_str().to_string(),
        progress: ProgressBody {
            current: progress.current_chapter,
            total: progress.total_chapters,
            percentage: progress.percentage,
        },
        started_at: progress.started_at.map(|t| t.to_rfc3339()),
        completed_at: progress.completed_at.map(|t| t.to_rfc3339()),
        error: progress.error.map(|e| JobErrorBody {
            kind: e.kind,
            message: e.message,
            failed_at_chapter: e.failed_at_chapter,
        }),
    }
}
