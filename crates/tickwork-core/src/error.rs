//! Job and validation errors.

use std::any::Any;
use std::time::Duration;

use thiserror::Error;

/// Cause attached to a failed [`JobResult`](crate::JobResult).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// The job body reported a failure.
    #[error("Job execution failed: {0}")]
    Failed(String),

    /// A time-boxed attempt exceeded its budget.
    #[error("Job '{job_id}' exceeded its time limit of {timeout:?}")]
    Timeout { job_id: String, timeout: Duration },

    /// The caller's cancellation signal fired.
    #[error("Job execution was cancelled")]
    Cancelled,

    /// No job instance could be produced for the job type.
    #[error("Failed to resolve job type '{job_type}': {reason}")]
    Resolution { job_type: String, reason: String },

    /// The job body panicked.
    #[error("Job panicked: {0}")]
    Panicked(String),
}

impl JobError {
    /// Create a [`JobError::Failed`] from any message.
    pub fn failed(message: impl Into<String>) -> Self {
        JobError::Failed(message.into())
    }

    /// Whether this error represents external cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, JobError::Cancelled)
    }

    /// Whether this error represents an exceeded time limit.
    pub fn is_timeout(&self) -> bool {
        matches!(self, JobError::Timeout { .. })
    }
}

impl From<std::io::Error> for JobError {
    fn from(err: std::io::Error) -> Self {
        JobError::Failed(err.to_string())
    }
}

impl From<serde_json::Error> for JobError {
    fn from(err: serde_json::Error) -> Self {
        JobError::Failed(err.to_string())
    }
}

/// Construction-time errors from [`JobBuilder`](crate::JobBuilder) and policy constructors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Job id is required")]
    MissingId,

    #[error("Job type is required")]
    MissingJobType,

    #[error("Job policy is required")]
    MissingPolicy,

    #[error("Retry policy needs at least 1 attempt, got {0}")]
    InvalidMaxAttempts(u32),

    #[error("Timeout must be greater than zero")]
    InvalidTimeout,

    #[error("Recurrence interval must be greater than zero")]
    InvalidInterval,
}

/// Extract a readable message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
