//! Built-in job kinds available to configuration files.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use tickwork_core::{CancellationToken, Job, JobContext, JobError, JobRegistry};

pub(crate) const HEARTBEAT: &str = "heartbeat";
pub(crate) const FLAKY: &str = "flaky";
pub(crate) const SLEEP: &str = "sleep";

/// Logs a line. Metadata: `message` (string).
pub(crate) struct HeartbeatJob;

#[async_trait]
impl Job for HeartbeatJob {
    async fn execute(&self, ctx: &JobContext, _cancel: &CancellationToken) -> Result<(), JobError> {
        let message = ctx
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("alive");
        info!(job_id = %ctx.job_id(), started_at = %ctx.started_at(), "{}", message);
        Ok(())
    }
}

/// Fails on every call except each `succeed_every`-th one (metadata, default 3).
///
/// The call counter is shared by every instance the factory creates, so
/// retries of the same job see increasing counts.
pub(crate) struct FlakyJob {
    calls: Arc<AtomicU64>,
}

#[async_trait]
impl Job for FlakyJob {
    async fn execute(&self, ctx: &JobContext, _cancel: &CancellationToken) -> Result<(), JobError> {
        let every = ctx
            .get("succeed_every")
            .and_then(|v| v.as_u64())
            .filter(|n| *n > 0)
            .unwrap_or(3);
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call % every == 0 {
            info!(job_id = %ctx.job_id(), call, "Flaky job succeeded");
            Ok(())
        } else {
            Err(JobError::failed(format!("call {} failed", call)))
        }
    }
}

/// Sleeps for `millis` (metadata, default 1000) unless cancelled first.
pub(crate) struct SleepJob;

#[async_trait]
impl Job for SleepJob {
    async fn execute(&self, ctx: &JobContext, cancel: &CancellationToken) -> Result<(), JobError> {
        let millis = ctx.get("millis").and_then(|v| v.as_u64()).unwrap_or(1_000);
        tokio::select! {
            _ = cancel.cancelled() => Err(JobError::Cancelled),
            _ = tokio::time::sleep(Duration::from_millis(millis)) => Ok(()),
        }
    }
}

/// Register every built-in job kind.
pub(crate) fn register_builtin_jobs(registry: &JobRegistry) {
    registry.register_fn(HEARTBEAT, || HeartbeatJob);

    let calls = Arc::new(AtomicU64::new(0));
    registry.register_fn(FLAKY, move || FlakyJob {
        calls: calls.clone(),
    });

    registry.register_fn(SLEEP, || SleepJob);
}
