use serde::Deserialize;
use serde::Serialize;

use crate::domain::{ContentReference, CourseKind, CourseSpec};

pub const MIN_LEVEL: i64 = 1;
pub const MAX_LEVEL: i64 = 5;
pub const MIN_CHAPTERS: i64 = 1;
pub const MAX_CHAPTERS: i64 = 50;

/// Raw submission body, before validation. Option flags default when omitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseRequest {
    pub title: Option<String>,
    pub level: Option<i64>,
    pub kind: Option<String>,
    pub topics: Option<Vec<String>>,
    pub total_chapters: Option<i64>,
    pub include_exercises: Option<bool>,
    pub include_vocabulary: Option<bool>,
    pub references: Option<Vec<ContentReference>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Carries every violated field, not just the first.
#[derive(Debug, thiserror::Error)]
#[error("invalid request: {} field(s) rejected", violations.len())]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

/// Normalize a raw request into a `CourseSpec`, or reject it with the full
/// list of violations. Touches no storage.
pub fn validate_request(request: CourseRequest) -> Result<CourseSpec, ValidationError> {
    let mut violations = Vec::new();

    let title = match request.title.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => Some(t.to_string()),
        _ => {
            violations.push(FieldViolation::new("title", "must be a non-empty string"));
            None
        }
    };

    let level = match request.level {
        Some(l) if (MIN_LEVEL..=MAX_LEVEL).contains(&l) => Some(l as u8),
        _ => {
            violations.push(FieldViolation::new(
                "level",
                format!("must be an integer between {} and {}", MIN_LEVEL, MAX_LEVEL),
            ));
            None
        }
    };

    let kind = match request.kind.as_deref() {
        Some(k) => match k.parse::<CourseKind>() {
            Ok(kind) => Some(kind),
            Err(_) => {
                violations.push(FieldViolation::new(
                    "kind",
                    "must be one of: lesson, dialogue, story, review",
                ));
                None
            }
        },
        None => {
            violations.push(FieldViolation::new("kind", "is required"));
            None
        }
    };

    let topics = match request.topics {
        Some(topics) if !topics.is_empty() => {
            let trimmed: Vec<String> = topics.iter().map(|t| t.trim().to_string()).collect();
            if trimmed.iter().any(|t| t.is_empty()) {
                violations.push(FieldViolation::new(
                    "topics",
                    "entries must be non-empty strings",
                ));
                None
            } else {
                Some(trimmed)
            }
        }
        _ => {
            violations.push(FieldViolation::new("topics", "must be a non-empty list"));
            None
        }
    };

    let total_chapters = match request.total_chapters {
        Some(n) if (MIN_CHAPTERS..=MAX_CHAPTERS).contains(&n) => Some(n as u32),
        _ => {
            violations.push(FieldViolation::new(
                "total_chapters",
                format!(
                    "must be an integer between {} and {}",
                    MIN_CHAPTERS, MAX_CHAPTERS
                ),
            ));
            None
        }
    };

    if !violations.is_empty() {
        return Err(ValidationError { violations });
    }

    // No violations means every field above resolved.
    let (Some(title), Some(level), Some(kind), Some(topics), Some(total_chapters)) =
        (title, level, kind, topics, total_chapters)
    else {
        return Err(ValidationError { violations });
    };

    Ok(CourseSpec {
        title,
        level,
        kind,
        topics,
        total_chapters,
        include_exercises: request.include_exercises.unwrap_or(true),
        include_vocabulary: request.include_vocabulary.unwrap_or(true),
        references: request.references.unwrap_or_default(),
    })
}
