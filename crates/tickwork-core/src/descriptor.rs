//! Job descriptor.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::job::Metadata;
use crate::policy::JobPolicy;

/// Name under which a job resolver knows how to produce a job instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobType(String);

impl JobType {
    /// Create a job type from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Job type named after a Rust type.
    pub fn of<J: ?Sized>() -> Self {
        Self(std::any::type_name::<J>().to_string())
    }

    /// Get the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for JobType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Immutable registration record for one job.
///
/// Built by [`JobBuilder`](crate::JobBuilder). A descriptor with a recurrence
/// interval is recurring; one without runs once, immediately.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    id: String,
    job_type: JobType,
    policy: Arc<dyn JobPolicy>,
    recurrence_interval: Option<Duration>,
    metadata: Option<Arc<Metadata>>,
}

impl JobDescriptor {
    pub(crate) fn new(
        id: String,
        job_type: JobType,
        policy: Arc<dyn JobPolicy>,
        recurrence_interval: Option<Duration>,
        metadata: Option<Metadata>,
    ) -> Self {
        Self {
            id,
            job_type,
            policy,
            recurrence_interval,
            metadata: metadata.map(Arc::new),
        }
    }

    /// Get the job ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the job type.
    pub fn job_type(&self) -> &JobType {
        &self.job_type
    }

    /// Get the execution policy.
    pub fn policy(&self) -> &Arc<dyn JobPolicy> {
        &self.policy
    }

    /// Whether the job repeats.
    pub fn is_recurring(&self) -> bool {
        self.recurrence_interval.is_some()
    }

    /// Get the recurrence interval, if recurring.
    pub fn recurrence_interval(&self) -> Option<Duration> {
        self.recurrence_interval
    }

    /// Get the metadata, if any.
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_deref()
    }

    /// Shared handle to the metadata, for building contexts without copying it.
    pub fn shared_metadata(&self) -> Option<Arc<Metadata>> {
        self.metadata.clone()
    }

    /// Time to wait before the next execution: the interval when recurring, zero otherwise.
    pub fn next_delay(&self) -> Duration {
        self.recurrence_interval.unwrap_or(Duration::ZERO)
    }
}
