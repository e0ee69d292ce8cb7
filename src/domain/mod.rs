mod chapter;
mod course_spec;
mod job;
mod job_error;
mod job_status;

pub use chapter::{ChapterArtifact, ChapterContent, Exercise, Section, VocabularyEntry};
pub use course_spec::{ContentReference, CourseKind, CourseSpec};
pub use job::{GenerationJob, JobId};
pub use job_error::{GenerationErrorKind, JobError};
pub use job_status::JobStatus;
