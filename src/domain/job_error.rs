use serde::{Deserialize, Serialize};

/// Failure recorded on a job when the pipeline stops.
///
/// Set exactly once, when the job transitions to Failed; chapters persisted
/// before `failed_at_chapter` stay in storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobError {
    pub kind: GenerationErrorKind,
    pub message: String,
    pub failed_at_chapter: u32,
}

/// Upstream provider failure categories, surfaced verbatim into
/// `last_error.kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationErrorKind {
    NotConfigured,
    UpstreamRateLimited,
    Timeout,
    Auth,
    InvalidResponse,
    RequestFailed,
}
