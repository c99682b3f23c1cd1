//! Composite policy.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::JobPolicy;
use crate::error::JobError;
use crate::job::{Job, JobContext, JobResult};

/// Chains two policies: the outer policy drives a job whose every run goes
/// through the inner policy.
///
/// `Retry` outer with `Timeout` inner time-boxes each attempt; `Timeout` outer
/// with `Retry` inner time-boxes the whole retry sequence.
#[derive(Debug, Clone)]
pub struct CompositePolicy {
    outer: Arc<dyn JobPolicy>,
    inner: Arc<dyn JobPolicy>,
}

impl CompositePolicy {
    /// Compose `outer` around `inner`.
    pub fn new(outer: Arc<dyn JobPolicy>, inner: Arc<dyn JobPolicy>) -> Self {
        Self { outer, inner }
    }

    /// Get the outer policy.
    pub fn outer(&self) -> &Arc<dyn JobPolicy> {
        &self.outer
    }

    /// Get the inner policy.
    pub fn inner(&self) -> &Arc<dyn JobPolicy> {
        &self.inner
    }
}

#[async_trait]
impl JobPolicy for CompositePolicy {
    async fn execute(
        &self,
        job: &dyn Job,
        ctx: &JobContext,
        cancel: &CancellationToken,
    ) -> JobResult {
        let wrapped = WrappedJob {
            job,
            policy: self.inner.as_ref(),
        };
        self.outer.execute(&wrapped, ctx, cancel).await
    }
}

/// Presents "run `job` under `policy`" as a job of its own.
struct WrappedJob<'a> {
    job: &'a dyn Job,
    policy: &'a dyn JobPolicy,
}

#[async_trait]
impl<'a> Job for WrappedJob<'a> {
    async fn execute(&self, ctx: &JobContext, cancel: &CancellationToken) -> Result<(), JobError> {
        self.policy.execute(self.job, ctx, cancel).await.into_result()
    }
}
