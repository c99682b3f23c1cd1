//! # Tickwork Core
//!
//! Data model and execution policies for the Tickwork job engine.
//!
//! ## Key Components
//!
//! - [`Job`]: A unit of work, executed with a [`JobContext`] and a cancellation token
//! - [`JobResult`]: Outcome of one execution (success, or failure with a [`JobError`] cause)
//! - [`JobPolicy`]: Wraps a job run with extra behavior ([`RetryPolicy`], [`TimeoutPolicy`],
//!   [`CompositePolicy`])
//! - [`JobDescriptor`]: Immutable registration record produced by [`JobBuilder`]
//! - [`JobStore`]: Registered descriptors keyed by job ID ([`InMemoryJobStore`])
//! - [`JobResolver`]: Produces a fresh job instance per execution ([`JobRegistry`])
//!
//! ## Policy composition
//!
//! ```text
//! CompositePolicy(outer = Retry, inner = Timeout)
//!
//!   Retry ──attempt 1──▶ Timeout ──▶ job   (time-boxed)
//!         ──attempt 2──▶ Timeout ──▶ job   (time-boxed)
//!         ──attempt N──▶ Timeout ──▶ job   (time-boxed)
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use tickwork_core::JobBuilder;
//!
//! let descriptor = JobBuilder::create()
//!     .with_id("cleanup")
//!     .with_job_type("cleanup")
//!     .every_minutes(5)
//!     .with_retry_and_timeout(3, Duration::from_secs(2), Duration::from_secs(30))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(descriptor.next_delay(), Duration::from_secs(300));
//! ```

pub mod builder;
pub mod descriptor;
pub mod error;
pub mod job;
pub mod policy;
pub mod registry;
pub mod store;

pub use builder::JobBuilder;
pub use descriptor::{JobDescriptor, JobType};
pub use error::{JobError, ValidationError, panic_message};
pub use job::{FnJob, Job, JobContext, JobResult, JobStatus, Metadata};
pub use policy::{
    CompositePolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, JobPolicy, PolicyExt, RetryPolicy,
    TimeoutPolicy,
};
pub use registry::{JobRegistry, JobResolver};
pub use store::{InMemoryJobStore, JobStore};

// Re-export CancellationToken for convenience
pub use tokio_util::sync::CancellationToken;
