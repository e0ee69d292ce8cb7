use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{ContentProvider, ContentProviderError};
use crate::domain::{ChapterContent, CourseSpec, Exercise, Section, VocabularyEntry};

/// Deterministic provider for scaffold mode: runs the full pipeline with no
/// upstream API or key, optionally delaying each chapter to imitate latency.
pub struct CannedProvider {
    response_delay: Duration,
}

impl CannedProvider {
    pub fn new(response_delay: Duration) -> Self {
        Self { response_delay }
    }
}

#[async_trait]
impl ContentProvider for CannedProvider {
    async fn generate_chapter(
        &self,
        spec: &CourseSpec,
        topic: &str,
        chapter_number: u32,
    ) -> Result<ChapterContent, ContentProviderError> {
        if !self.response_delay.is_zero() {
            tokio::time::sleep(self.response_delay).await;
        }

        let vocabulary = if spec.include_vocabulary {
            vec![VocabularyEntry {
                term: format!("{} (term)", topic),
                translation: format!("{} (translation)", topic),
                example: Some(format!("An example sentence about {}.", topic)),
            }]
        } else {
            Vec::new()
        };

        let exercises = if spec.include_exercises {
            vec![Exercise {
                prompt: format!("Practice question on {}.", topic),
                answer: "Sample answer.".to_string(),
            }]
        } else {
            Vec::new()
        };

        Ok(ChapterContent {
            title: format!("Chapter {}: {}", chapter_number, topic),
            introduction: format!(
                "Scaffolded chapter {} of \"{}\", covering {}.",
                chapter_number, spec.title, topic
            ),
            vocabulary,
            grammar_points: vec![format!("Grammar point for level {}.", spec.level)],
            exercises,
            sections: vec![Section {
                heading: topic.to_string(),
                body: format!("Placeholder body text about {}.", topic),
            }],
            estimated_minutes: 15,
        })
    }
}
