use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::application::services::{validate_request, CourseRequest, FieldViolation};
use crate::presentation::state::AppState;

const CALLER_ID_HEADER: &str = "x-caller-id";
const ANONYMOUS_CALLER: &str = "anonymous";

#[derive(Serialize)]
pub struct SubmitResponse {
    pub job_id: String,
    pub status: String,
    pub status_url: String,
}

#[derive(Serialize)]
pub struct ValidationErrorResponse {
    pub errors: Vec<FieldViolation>,
}

#[derive(Serialize)]
pub struct RateLimitedResponse {
    pub error: String,
    pub retry_after_seconds: u64,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Accept a course-generation request: validate, rate-limit, create the
/// queued job, and return immediately. Generation happens in the background;
/// callers poll the status URL.
#[tracing::instrument(skip(state, headers, request))]
pub async fn submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CourseRequest>,
) -> impl IntoResponse {
    let spec = match validate_request(request) {
        Ok(spec) => spec,
        Err(e) => {
            tracing::debug!(violations = e.violations.len(), "Request rejected");
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ValidationErrorResponse {
                    errors: e.violations,
                }),
            )
                .into_response();
        }
    };

    let caller = headers
        .get(CALLER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(ANONYMOUS_CALLER);

    let decision = match state
        .rate_limiter
        .allow(
            caller,
            state.rate_limit.submissions_per_window,
            state.rate_limit.window(),
        )
        .await
    {
        Ok(decision) => decision,
        Err(e) => {
            tracing::error!(error = %e, "Rate limit store unavailable");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Rate limit check failed".to_string(),
                }),
            )
                .into_response();
        }
    };

    if !decision.allowed {
        let retry_after_seconds = decision.retry_after.map(|d| d.as_secs()).unwrap_or(0);
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [("retry-after", retry_after_seconds.to_string())],
            Json(RateLimitedResponse {
                error: "Submission limit reached".to_string(),
                retry_after_seconds,
            }),
        )
            .into_response();
    }

    let owner_id = (caller != ANONYMOUS_CALLER).then(|| caller.to_string());
    let job_id = match state.job_store.create_queued(spec, owner_id).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create job record");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to create job: {}", e),
                }),
            )
                .into_response();
        }
    };

    tracing::info!(job_id = %job_id.as_uuid(), "Job accepted for generation");

    (
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            job_id: job_id.as_uuid().to_string(),
            // The API reports the phase, not the row: the job is queued for a
            // dispatcher that will pick it up on its next poll.
            status: "Generating".to_string(),
            status_url: format!("/api/v1/jobs/{}", job_id.as_uuid()),
        }),
    )
        .into_response()
}
