//! # Tickwork Config
//!
//! TOML configuration for the Tickwork scheduler: scheduler tuning, logging,
//! and the list of jobs to register at startup.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
