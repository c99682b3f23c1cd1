//! Fluent builder for [`JobDescriptor`].

use std::sync::Arc;
use std::time::Duration;

use crate::descriptor::{JobDescriptor, JobType};
use crate::error::ValidationError;
use crate::job::Metadata;
use crate::policy::{JobPolicy, PolicyExt, RetryPolicy, TimeoutPolicy};

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;
const DAYS_PER_MONTH: u64 = 30;
const DAYS_PER_YEAR: u64 = 365;

/// Builder for [`JobDescriptor`].
///
/// Setters only record values; [`JobBuilder::build`] validates them.
#[derive(Debug, Default)]
pub struct JobBuilder {
    id: Option<String>,
    job_type: Option<JobType>,
    policy: Option<Arc<dyn JobPolicy>>,
    recurrence_interval: Option<Duration>,
    metadata: Option<Metadata>,
    policy_error: Option<ValidationError>,
}

impl JobBuilder {
    /// Create an empty builder.
    pub fn create() -> Self {
        Self::default()
    }

    /// Set the job ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the job type by name.
    pub fn with_job_type(mut self, job_type: impl Into<JobType>) -> Self {
        self.job_type = Some(job_type.into());
        self
    }

    /// Set the job type to the Rust type `J`.
    pub fn with_job<J: ?Sized>(mut self) -> Self {
        self.job_type = Some(JobType::of::<J>());
        self
    }

    /// Set the execution policy.
    pub fn with_policy(self, policy: impl JobPolicy + 'static) -> Self {
        self.with_shared_policy(Arc::new(policy))
    }

    /// Set an already shared execution policy.
    pub fn with_shared_policy(mut self, policy: Arc<dyn JobPolicy>) -> Self {
        self.policy = Some(policy);
        self.policy_error = None;
        self
    }

    /// Make the job recurring with the given interval.
    pub fn recurring_every(mut self, interval: Duration) -> Self {
        self.recurrence_interval = Some(interval);
        self
    }

    /// Replace the metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Add a single metadata entry.
    pub fn with_metadata_entry(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata
            .get_or_insert_with(Metadata::new)
            .insert(key.into(), value.into());
        self
    }

    // Unit helpers saturate at `u64::MAX` seconds instead of overflowing.

    pub fn every_seconds(self, seconds: u64) -> Self {
        self.recurring_every(Duration::from_secs(seconds))
    }

    pub fn every_minutes(self, minutes: u64) -> Self {
        self.recurring_every(Duration::from_secs(minutes.saturating_mul(SECS_PER_MINUTE)))
    }

    pub fn every_hours(self, hours: u64) -> Self {
        self.recurring_every(Duration::from_secs(hours.saturating_mul(SECS_PER_HOUR)))
    }

    pub fn every_days(self, days: u64) -> Self {
        self.recurring_every(Duration::from_secs(days.saturating_mul(SECS_PER_DAY)))
    }

    pub fn every_weeks(self, weeks: u64) -> Self {
        self.every_days(weeks.saturating_mul(7))
    }

    /// Months are approximated as 30 days.
    pub fn every_months(self, months: u64) -> Self {
        self.every_days(months.saturating_mul(DAYS_PER_MONTH))
    }

    /// Years are approximated as 365 days.
    pub fn every_years(self, years: u64) -> Self {
        self.every_days(years.saturating_mul(DAYS_PER_YEAR))
    }

    /// Attach a [`RetryPolicy`]. Invalid parameters are reported by `build`.
    pub fn with_simple_retry(self, max_attempts: u32, delay: Duration) -> Self {
        match RetryPolicy::new(max_attempts, delay) {
            Ok(retry) => self.with_policy(retry),
            Err(e) => self.reject_policy(e),
        }
    }

    /// Attach a [`RetryPolicy`] whose every attempt is bounded by a [`TimeoutPolicy`].
    pub fn with_retry_and_timeout(
        self,
        max_attempts: u32,
        delay: Duration,
        timeout: Duration,
    ) -> Self {
        let policy = RetryPolicy::new(max_attempts, delay)
            .and_then(|retry| Ok(retry.wrap(TimeoutPolicy::new(timeout)?)));
        match policy {
            Ok(composite) => self.with_policy(composite),
            Err(e) => self.reject_policy(e),
        }
    }

    fn reject_policy(mut self, error: ValidationError) -> Self {
        self.policy = None;
        self.policy_error = Some(error);
        self
    }

    /// Validate the recorded fields and produce the descriptor.
    pub fn build(self) -> Result<JobDescriptor, ValidationError> {
        let id = match self.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => return Err(ValidationError::MissingId),
        };
        let job_type = self.job_type.ok_or(ValidationError::MissingJobType)?;
        let policy = match (self.policy, self.policy_error) {
            (Some(policy), _) => policy,
            (None, Some(error)) => return Err(error),
            (None, None) => return Err(ValidationError::MissingPolicy),
        };
        if self.recurrence_interval.is_some_and(|i| i.is_zero()) {
            return Err(ValidationError::InvalidInterval);
        }

        Ok(JobDescriptor::new(
            id,
            job_type,
            policy,
            self.recurrence_interval,
            self.metadata,
        ))
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
