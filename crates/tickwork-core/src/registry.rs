//! Job instance resolution.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::descriptor::JobType;
use crate::error::JobError;
use crate::job::Job;

/// Produces a fresh job instance for a job type.
pub trait JobResolver: Send + Sync {
    /// Resolve a new instance. Called once per execution.
    fn resolve(&self, job_type: &JobType) -> Result<Box<dyn Job>, JobError>;
}

type JobFactory = Arc<dyn Fn() -> Result<Box<dyn Job>, JobError> + Send + Sync>;

/// [`JobResolver`] backed by a map of factory closures.
#[derive(Default)]
pub struct JobRegistry {
    factories: DashMap<JobType, JobFactory>,
}

impl JobRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory that cannot fail. Replaces any factory for the same type.
    pub fn register_fn<F, J>(&self, job_type: impl Into<JobType>, factory: F)
    where
        F: Fn() -> J + Send + Sync + 'static,
        J: Job + 'static,
    {
        self.register_factory(job_type, move || Ok(Box::new(factory()) as Box<dyn Job>));
    }

    /// Register a fallible factory. Replaces any factory for the same type.
    pub fn register_factory<F>(&self, job_type: impl Into<JobType>, factory: F)
    where
        F: Fn() -> Result<Box<dyn Job>, JobError> + Send + Sync + 'static,
    {
        let job_type = job_type.into();
        debug!(job_type = %job_type, "Registered job factory");
        self.factories.insert(job_type, Arc::new(factory));
    }

    /// Register `J::default()` under the Rust type name of `J`.
    pub fn register_default<J>(&self)
    where
        J: Job + Default + 'static,
    {
        self.register_fn(JobType::of::<J>(), J::default);
    }

    pub fn contains(&self, job_type: &JobType) -> bool {
        self.factories.contains_key(job_type)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Registered job types, sorted.
    pub fn job_types(&self) -> Vec<JobType> {
        let mut types: Vec<JobType> = self.factories.iter().map(|e| e.key().clone()).collect();
        types.sort();
        types
    }
}

impl JobResolver for JobRegistry {
    fn resolve(&self, job_type: &JobType) -> Result<Box<dyn Job>, JobError> {
        // Clone the factory out so the shard lock is not held while it runs.
        let factory = self
            .factories
            .get(job_type)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| JobError::Resolution {
                job_type: job_type.to_string(),
                reason: "no factory registered".to_string(),
            })?;
        factory()
    }
}

impl fmt::Debug for JobRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobRegistry")
            .field("job_types", &self.job_types())
            .finish()
    }
}
