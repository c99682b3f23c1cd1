//! Scheduler errors.

use thiserror::Error;

/// Scheduler lifecycle errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// `start` was called on a running scheduler.
    #[error("Scheduler is already running")]
    AlreadyRunning,

    /// `start` was called outside a Tokio runtime.
    #[error("Scheduler must be started from within a Tokio runtime")]
    NoRuntime,
}
