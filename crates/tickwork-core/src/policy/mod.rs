//! Execution policies.
//!
//! A policy decides how a job is invoked: how many times, under which time
//! budget, and how the outcome is reported. Policies compose by decoration,
//! see [`CompositePolicy`].

mod composite;
mod retry;
mod timeout;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::job::{Job, JobContext, JobResult};

pub use composite::CompositePolicy;
pub use retry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, RetryPolicy};
pub use timeout::TimeoutPolicy;

/// Wraps a job run with additional behavior.
#[async_trait]
pub trait JobPolicy: Send + Sync + fmt::Debug {
    /// Run `job` under this policy and report the outcome.
    async fn execute(
        &self,
        job: &dyn Job,
        ctx: &JobContext,
        cancel: &CancellationToken,
    ) -> JobResult;
}

/// Composition helpers available on every policy.
pub trait PolicyExt: JobPolicy + Sized + 'static {
    /// Make `self` the outer layer and `inner` the inner layer.
    fn wrap<P: JobPolicy + 'static>(self, inner: P) -> CompositePolicy {
        CompositePolicy::new(Arc::new(self), Arc::new(inner))
    }
}

impl<T: JobPolicy + Sized + 'static> PolicyExt for T {}

#[cfg(test)]
pub(crate) mod test_jobs {
    //! Jobs with scripted behavior shared by the policy tests.

    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::error::JobError;

    /// Fails the first `failures` invocations, then succeeds.
    pub struct FlakyJob {
        pub calls: AtomicU32,
        pub failures: u32,
    }

    impl FlakyJob {
        pub fn new(failures: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures,
            }
        }

        pub fn always_failing() -> Self {
            Self::new(u32::MAX)
        }

        pub fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Job for FlakyJob {
        async fn execute(&self, _ctx: &JobContext, _cancel: &CancellationToken) -> Result<(), JobError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(JobError::failed(format!("failure #{call}")))
            } else {
                Ok(())
            }
        }
    }

    /// Sleeps for `duration` on every call, honoring cancellation.
    pub struct SlowJob {
        pub calls: AtomicU32,
        pub duration: Duration,
    }

    impl SlowJob {
        pub fn new(duration: Duration) -> Self {
            Self {
                calls: AtomicU32::new(0),
                duration,
            }
        }

        pub fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Job for SlowJob {
        async fn execute(&self, _ctx: &JobContext, cancel: &CancellationToken) -> Result<(), JobError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::select! {
                _ = cancel.cancelled() => Err(JobError::Cancelled),
                _ = tokio::time::sleep(self.duration) => Ok(()),
            }
        }
    }

    /// Never completes and never looks at its cancellation token.
    pub struct StuckJob;

    #[async_trait]
    impl Job for StuckJob {
        async fn execute(&self, _ctx: &JobContext, _cancel: &CancellationToken) -> Result<(), JobError> {
            std::future::pending().await
        }
    }
}
