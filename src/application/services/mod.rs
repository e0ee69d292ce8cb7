mod dispatcher;
mod progress_reporter;
mod rate_limiter;
mod request_validator;
mod watchdog;

pub use dispatcher::{DispatchError, JobDispatcher};
pub use progress_reporter::{JobProgress, ProgressError, ProgressReporter};
pub use rate_limiter::{RateLimitDecision, RateLimiter};
pub use request_validator::{validate_request, CourseRequest, FieldViolation, ValidationError};
pub use watchdog::Watchdog;
