//! Single-execution runner.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use tickwork_core::{
    CancellationToken, Job, JobContext, JobDescriptor, JobError, JobResolver, JobResult,
    panic_message,
};
use tracing::{debug, error};

/// Executes one run of a descriptor: resolve a fresh job, build its context,
/// apply the descriptor's policy.
pub struct JobRunner {
    resolver: Arc<dyn JobResolver>,
}

impl JobRunner {
    /// Create a runner resolving jobs through `resolver`.
    pub fn new(resolver: Arc<dyn JobResolver>) -> Self {
        Self { resolver }
    }

    /// Run the descriptor once.
    ///
    /// Never unwinds. Resolution failures, including a panicking factory,
    /// come back as a failed [`JobResult`] with a [`JobError::Resolution`]
    /// cause; a panicking job body as [`JobError::Panicked`].
    pub async fn run(&self, descriptor: &JobDescriptor, cancel: &CancellationToken) -> JobResult {
        let job = match self.resolve(descriptor) {
            Ok(job) => job,
            Err(e) => {
                error!(job_id = %descriptor.id(), error = %e, "Failed to resolve job");
                return JobResult::failed(e);
            }
        };

        let ctx = JobContext::new(descriptor.id(), descriptor.shared_metadata());
        debug!(job_id = %descriptor.id(), job_type = %descriptor.job_type(), "Executing job");

        let execution = descriptor.policy().execute(job.as_ref(), &ctx, cancel);
        match AssertUnwindSafe(execution).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(&*payload);
                error!(job_id = %descriptor.id(), panic = %message, "Job panicked");
                JobResult::failed(JobError::Panicked(message))
            }
        }
    }

    fn resolve(&self, descriptor: &JobDescriptor) -> Result<Box<dyn Job>, JobError> {
        let job_type = descriptor.job_type();
        panic::catch_unwind(AssertUnwindSafe(|| self.resolver.resolve(job_type))).unwrap_or_else(
            |payload| {
                Err(JobError::Resolution {
                    job_type: job_type.to_string(),
                    reason: format!("factory panicked: {}", panic_message(&*payload)),
                })
            },
        )
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
