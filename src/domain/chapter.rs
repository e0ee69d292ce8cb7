use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::JobId;

/// One generated chapter, keyed by `(job_id, chapter_number)`.
///
/// Upserted, never appended: re-running chapter `k` overwrites the prior row,
/// which is what makes pipeline retries idempotent.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterArtifact {
    pub job_id: JobId,
    pub chapter_number: u32,
    pub content: ChapterContent,
    pub generated_at: DateTime<Utc>,
}

impl ChapterArtifact {
    pub fn new(job_id: JobId, chapter_number: u32, content: ChapterContent) -> Self {
        Self {
            job_id,
            chapter_number,
            content,
            generated_at: Utc::now(),
        }
    }
}

/// Payload returned by the content provider for a single chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterContent {
    pub title: String,
    pub introduction: String,
    #[serde(default)]
    pub vocabulary: Vec<VocabularyEntry>,
    #[serde(default)]
    pub grammar_points: Vec<String>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    pub sections: Vec<Section>,
    pub estimated_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub term: String,
    pub translation: String,
    pub example: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub prompt: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub body: String,
}
