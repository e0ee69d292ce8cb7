use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Immutable description of the course a job must produce.
///
/// Fixed at job creation; changing any of it means submitting a new job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseSpec {
    pub title: String,
    pub level: u8,
    pub kind: CourseKind,
    pub topics: Vec<String>,
    pub total_chapters: u32,
    pub include_exercises: bool,
    pub include_vocabulary: bool,
    #[serde(default)]
    pub references: Vec<ContentReference>,
}

impl CourseSpec {
    /// Topic for chapter `chapter_number` (1-based). Topics rotate rather
    /// than exhaust when `total_chapters` exceeds the topic count.
    pub fn topic_for_chapter(&self, chapter_number: u32) -> &str {
        let index = (chapter_number as usize - 1) % self.topics.len();
        &self.topics[index]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseKind {
    Lesson,
    Dialogue,
    Story,
    Review,
}

impl CourseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseKind::Lesson => "lesson",
            CourseKind::Dialogue => "dialogue",
            CourseKind::Story => "story",
            CourseKind::Review => "review",
        }
    }
}

impl FromStr for CourseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lesson" => Ok(CourseKind::Lesson),
            "dialogue" => Ok(CourseKind::Dialogue),
            "story" => Ok(CourseKind::Story),
            "review" => Ok(CourseKind::Review),
            _ => Err(format!("Invalid course kind: {}", s)),
        }
    }
}

impl fmt::Display for CourseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Supplementary material the provider may draw on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentReference {
    pub label: String,
    pub url: String,
}
