//! Job trait, execution context and result.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::JobError;

/// Key/value metadata attached to a descriptor and passed to every run.
pub type Metadata = HashMap<String, serde_json::Value>;

/// A unit of work.
///
/// Implementations should observe `cancel` at their own suspension points and
/// return [`JobError::Cancelled`] when it fires.
#[async_trait]
pub trait Job: Send + Sync {
    /// Execute the job once.
    async fn execute(&self, ctx: &JobContext, cancel: &CancellationToken) -> Result<(), JobError>;
}

/// Execution context handed to a job.
#[derive(Debug, Clone)]
pub struct JobContext {
    job_id: String,
    metadata: Option<Arc<Metadata>>,
    started_at: DateTime<Utc>,
}

impl JobContext {
    /// Create a context stamped with the current time.
    pub fn new(job_id: impl Into<String>, metadata: Option<Arc<Metadata>>) -> Self {
        Self {
            job_id: job_id.into(),
            metadata,
            started_at: Utc::now(),
        }
    }

    /// Get the job ID.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Get the metadata, if any was configured.
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_deref()
    }

    /// Look up a single metadata value.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.as_ref().and_then(|m| m.get(key))
    }

    /// Get the time this execution started.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// Derived status of a [`JobResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// The job completed.
    Success,
    /// The job failed, timed out or was cancelled.
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Success => write!(f, "Success"),
            JobStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Outcome of one job execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    success: bool,
    cause: Option<JobError>,
}

impl JobResult {
    /// A successful outcome.
    pub fn success() -> Self {
        Self {
            success: true,
            cause: None,
        }
    }

    /// A failed outcome, optionally carrying its cause.
    pub fn failed(cause: impl Into<Option<JobError>>) -> Self {
        Self {
            success: false,
            cause: cause.into(),
        }
    }

    /// Whether the job completed.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Derived status.
    pub fn status(&self) -> JobStatus {
        if self.success {
            JobStatus::Success
        } else {
            JobStatus::Failed
        }
    }

    /// Failure cause, if any.
    pub fn cause(&self) -> Option<&JobError> {
        self.cause.as_ref()
    }

    /// Whether the failure was caused by an exceeded time limit.
    pub fn is_timeout(&self) -> bool {
        self.cause.as_ref().is_some_and(JobError::is_timeout)
    }

    /// Whether the failure was caused by external cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.cause.as_ref().is_some_and(JobError::is_cancelled)
    }

    /// Convert into a `Result`, so an outer policy sees the inner cause.
    pub fn into_result(self) -> Result<(), JobError> {
        if self.success {
            return Ok(());
        }
        Err(self
            .cause
            .unwrap_or_else(|| JobError::failed("job failed without a cause")))
    }
}

/// Job backed by an async closure.
pub struct FnJob<F> {
    f: F,
}

impl<F, Fut> FnJob<F>
where
    F: Fn(JobContext, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), JobError>> + Send + 'static,
{
    /// Wrap a closure as a job.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Job for FnJob<F>
where
    F: Fn(JobContext, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), JobError>> + Send + 'static,
{
    async fn execute(&self, ctx: &JobContext, cancel: &CancellationToken) -> Result<(), JobError> {
        (self.f)(ctx.clone(), cancel.clone()).await
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
