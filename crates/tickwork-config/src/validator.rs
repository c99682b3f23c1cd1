//! Configuration validation.

use std::collections::HashSet;

use crate::error::ConfigError;
use crate::schema::{Config, JobConfig};

/// Intervals above this are almost always a unit mistake.
const MAX_REASONABLE_INTERVAL_SECS: u64 = 366 * 24 * 60 * 60;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Turn the first error into a [`ConfigError`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_scheduler(config, &mut result);
        Self::validate_logging(config, &mut result);

        let mut seen = HashSet::new();
        for (index, job) in config.jobs.iter().enumerate() {
            Self::validate_job(index, job, &mut result);
            if !job.id.is_empty() && !seen.insert(job.id.as_str()) {
                result.add_warning(ValidationWarning::new(
                    format!("jobs[{}].id", index),
                    format!(
                        "Duplicate job id '{}', only the first entry will be scheduled",
                        job.id
                    ),
                ));
            }
        }

        Ok(result)
    }

    fn validate_scheduler(config: &Config, result: &mut ValidationResult) {
        if config.scheduler.shutdown_timeout_ms == 0 {
            result.add_warning(ValidationWarning::new(
                "scheduler.shutdown_timeout_ms",
                "Shutdown timeout is 0, running jobs will be aborted immediately",
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        if config.logging.level.trim().is_empty() {
            result.add_error(ValidationError::new(
                "logging.level",
                "Log level cannot be empty",
            ));
        }
    }

    fn validate_job(index: usize, job: &JobConfig, result: &mut ValidationResult) {
        let path = |field: &str| format!("jobs[{}].{}", index, field);

        if job.id.trim().is_empty() {
            result.add_error(ValidationError::new(path("id"), "Job id cannot be empty"));
        }

        if job.kind.trim().is_empty() {
            result.add_error(ValidationError::new(
                path("kind"),
                "Job kind cannot be empty",
            ));
        }

        match job.interval_secs {
            Some(0) => result.add_error(ValidationError::new(
                path("interval_secs"),
                "Interval must be greater than 0",
            )),
            Some(secs) if secs > MAX_REASONABLE_INTERVAL_SECS => {
                result.add_warning(ValidationWarning::new(
                    path("interval_secs"),
                    format!("Interval of {} seconds is longer than a year", secs),
                ))
            }
            _ => {}
        }

        if job.retry.max_attempts == 0 {
            result.add_error(ValidationError::new(
                path("retry.max_attempts"),
                "max_attempts must be at least 1",
            ));
        }

        if job.timeout_ms == Some(0) {
            result.add_error(ValidationError::new(
                path("timeout_ms"),
                "Timeout must be greater than 0",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
