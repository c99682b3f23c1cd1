//! Retry policy.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::JobPolicy;
use crate::error::{JobError, ValidationError};
use crate::job::{Job, JobContext, JobResult};

/// Delay between attempts when none is given.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Attempts made by [`RetryPolicy::default`].
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Re-runs a failing job up to `max_attempts` times, waiting `delay` between attempts.
///
/// The first success ends the sequence. The last attempt's failure is returned
/// without waiting. Cancellation observed during an attempt or a delay ends the
/// sequence with [`JobError::Cancelled`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Create a retry policy. `max_attempts` must be at least 1.
    pub fn new(max_attempts: u32, delay: Duration) -> Result<Self, ValidationError> {
        if max_attempts < 1 {
            return Err(ValidationError::InvalidMaxAttempts(max_attempts));
        }
        Ok(Self {
            max_attempts,
            delay,
        })
    }

    /// Create a retry policy with the default delay.
    pub fn with_max_attempts(max_attempts: u32) -> Result<Self, ValidationError> {
        Self::new(max_attempts, DEFAULT_RETRY_DELAY)
    }

    /// Get the maximum number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Get the delay between attempts.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

#[async_trait]
impl JobPolicy for RetryPolicy {
    async fn execute(
        &self,
        job: &dyn Job,
        ctx: &JobContext,
        cancel: &CancellationToken,
    ) -> JobResult {
        let mut attempt = 0;
        let mut last_cause = None;

        while attempt < self.max_attempts && !cancel.is_cancelled() {
            attempt += 1;
            debug!(job_id = %ctx.job_id(), attempt, max_attempts = self.max_attempts, "running attempt");

            match job.execute(ctx, cancel).await {
                Ok(()) => return JobResult::success(),
                Err(e) if e.is_cancelled() || cancel.is_cancelled() => {
                    return JobResult::failed(JobError::Cancelled);
                }
                Err(e) if attempt < self.max_attempts => {
                    warn!(
                        job_id = %ctx.job_id(),
                        attempt,
                        error = %e,
                        "attempt failed, retrying in {:?}",
                        self.delay
                    );
                    last_cause = Some(e);

                    tokio::select! {
                        _ = cancel.cancelled() => return JobResult::failed(JobError::Cancelled),
                        _ = tokio::time::sleep(self.delay) => {}
                    }
                }
                Err(e) => {
                    warn!(job_id = %ctx.job_id(), attempt, error = %e, "final attempt failed");
                    return JobResult::failed(e);
                }
            }
        }

        if cancel.is_cancelled() {
            return JobResult::failed(JobError::Cancelled);
        }
        JobResult::failed(last_cause)
    }
}
