//! # Tickwork Scheduler
//!
//! Runs registered jobs on independent, cancellable loops.
//!
//! ## Features
//!
//! - One Tokio task per registered job
//! - Idempotent registration, also after start
//! - Stop by cancellation, or shutdown with a bounded drain
//! - Panic containment per loop iteration
//! - Configurable overrun handling for recurring jobs
//! - Per-job loop state and run statistics

pub mod error;
pub mod runner;
pub mod scheduler;

pub use error::SchedulerError;
pub use runner::JobRunner;
pub use scheduler::{JobLoopState, JobScheduler, JobStats, ShutdownReport};
pub use tickwork_config::{OverrunPolicy, SchedulerConfig};
