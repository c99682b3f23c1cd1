//! Timeout policy.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::JobPolicy;
use crate::error::{JobError, ValidationError};
use crate::job::{Job, JobContext, JobResult};

/// Bounds a single job invocation by a time budget.
///
/// The job runs with a child token cancelled either by the caller's token or by
/// the timer. Only the timer case is reported as [`JobError::Timeout`]; caller
/// cancellation is reported as [`JobError::Cancelled`]. A job that ignores its
/// token is dropped when the timer fires.
#[derive(Debug, Clone)]
pub struct TimeoutPolicy {
    timeout: Duration,
}

impl TimeoutPolicy {
    /// Create a timeout policy. `timeout` must be greater than zero.
    pub fn new(timeout: Duration) -> Result<Self, ValidationError> {
        if timeout.is_zero() {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(Self { timeout })
    }

    /// Get the time budget.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl JobPolicy for TimeoutPolicy {
    async fn execute(
        &self,
        job: &dyn Job,
        ctx: &JobContext,
        cancel: &CancellationToken,
    ) -> JobResult {
        let attempt_token = cancel.child_token();
        let mut run = job.execute(ctx, &attempt_token);

        tokio::select! {
            biased;

            outcome = &mut run => match outcome {
                Ok(()) => JobResult::success(),
                Err(_) if cancel.is_cancelled() => JobResult::failed(JobError::Cancelled),
                Err(e) => JobResult::failed(e),
            },
            _ = cancel.cancelled() => JobResult::failed(JobError::Cancelled),
            _ = tokio::time::sleep(self.timeout) => {
                attempt_token.cancel();
                warn!(job_id = %ctx.job_id(), timeout = ?self.timeout, "job timed out");
                JobResult::failed(JobError::Timeout {
                    job_id: ctx.job_id().to_string(),
                    timeout: self.timeout,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::test_jobs::{FlakyJob, SlowJob, StuckJob};
    use tokio::time::Instant;

    #[test]
    fn test_rejects_zero_timeout() {
        assert_eq!(
            TimeoutPolicy::new(Duration::ZERO).unwrap_err(),
            ValidationError::InvalidTimeout
        );
        assert!(TimeoutPolicy::new(Duration::from_millis(1)).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_job_succeeds() {
        let policy = TimeoutPolicy::new(Duration::from_millis(100)).unwrap();
        let job = SlowJob::new(Duration::from_millis(10));

        let result = policy
            .execute(&job, &JobContext::new("fast", None), &CancellationToken::new())
            .await;

        assert!(result.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_job_times_out() {
        let policy = TimeoutPolicy::new(Duration::from_millis(100)).unwrap();
        let started = Instant::now();

        let result = policy
            .execute(&StuckJob, &JobContext::new("stuck", None), &CancellationToken::new())
            .await;

        assert!(result.is_timeout());
        assert!(!result.is_cancelled());
        assert_eq!(
            result.cause(),
            Some(&JobError::Timeout {
                job_id: "stuck".to_string(),
                timeout: Duration::from_millis(100),
            })
        );
        assert!(started.elapsed() >= Duration::from_millis(100));
        assert!(started.elapsed() < Duration::from_millis(150));
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_cancellation_is_not_timeout() {
        let policy = TimeoutPolicy::new(Duration::from_millis(100)).unwrap();
        let job = SlowJob::new(Duration::from_secs(10));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            trigger.cancel();
        });

        let result = policy
            .execute(&job, &JobContext::new("external", None), &cancel)
            .await;

        assert!(result.is_cancelled());
        assert!(!result.is_timeout());
    }

    #[tokio::test]
    async fn test_job_error_passes_through() {
        let policy = TimeoutPolicy::new(Duration::from_secs(5)).unwrap();
        let job = FlakyJob::always_failing();

        let result = policy
            .execute(&job, &JobContext::new("err", None), &CancellationToken::new())
            .await;

        assert_eq!(result.cause(), Some(&JobError::failed("failure #1")));
    }
}
