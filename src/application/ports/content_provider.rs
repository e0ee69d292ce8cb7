use async_trait::async_trait;

use crate::domain::{ChapterContent, CourseSpec, GenerationErrorKind};

/// The consumed chapter-generation capability. One chapter per call; the
/// orchestrator never retries a failed chapter.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    async fn generate_chapter(
        &self,
        spec: &CourseSpec,
        topic: &str,
        chapter_number: u32,
    ) -> Result<ChapterContent, ContentProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ContentProviderError {
    #[error("provider not configured: {0}")]
    NotConfigured(String),
    #[error("upstream rate limited")]
    RateLimited,
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("authentication rejected: {0}")]
    Auth(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("api request failed: {0}")]
    RequestFailed(String),
}

impl ContentProviderError {
    /// Category recorded on the job when this error ends the pipeline.
    pub fn kind(&self) -> GenerationErrorKind {
        match self {
            ContentProviderError::NotConfigured(_) => GenerationErrorKind::NotConfigured,
            ContentProviderError::RateLimited => GenerationErrorKind::UpstreamRateLimited,
            ContentProviderError::Timeout(_) => GenerationErrorKind::Timeout,
            ContentProviderError::Auth(_) => GenerationErrorKind::Auth,
            ContentProviderError::InvalidResponse(_) => GenerationErrorKind::InvalidResponse,
            ContentProviderError::RequestFailed(_) => GenerationErrorKind::RequestFailed,
        }
    }
}
