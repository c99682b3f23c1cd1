//! Turns configured `[[jobs]]` entries into scheduler registrations.

use tracing::{info, warn};

use tickwork_config::JobConfig;
use tickwork_core::{JobBuilder, JobDescriptor, ValidationError};
use tickwork_scheduler::JobScheduler;

/// Build the descriptor for one configured job.
///
/// With `timeout_ms` set, every retry attempt is time-boxed.
pub(crate) fn descriptor_from_config(job: &JobConfig) -> Result<JobDescriptor, ValidationError> {
    let mut builder = JobBuilder::create()
        .with_id(job.id.as_str())
        .with_job_type(job.kind.as_str());

    builder = match job.timeout() {
        Some(timeout) => {
            builder.with_retry_and_timeout(job.retry.max_attempts, job.retry.delay(), timeout)
        }
        None => builder.with_simple_retry(job.retry.max_attempts, job.retry.delay()),
    };

    if let Some(interval) = job.interval() {
        builder = builder.recurring_every(interval);
    }
    if !job.metadata.is_empty() {
        builder = builder.with_metadata(job.metadata.clone());
    }

    builder.build()
}

/// Register every enabled job. Returns how many were newly registered.
pub(crate) fn register_configured_jobs(
    scheduler: &JobScheduler,
    jobs: &[JobConfig],
) -> Result<usize, ValidationError> {
    let mut registered = 0;
    for job in jobs {
        if !job.enabled {
            info!(job_id = %job.id, "Job disabled, skipping");
            continue;
        }
        let descriptor = descriptor_from_config(job)?;
        if scheduler.register(descriptor) {
            registered += 1;
        } else {
            warn!(job_id = %job.id, "Duplicate job id, keeping the first entry");
        }
    }
    Ok(registered)
}
