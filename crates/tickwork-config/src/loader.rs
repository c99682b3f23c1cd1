//! Configuration loader.

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Config;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a file, falling back to defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        let mut result = content.to_string();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.tickwork/logs`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::OverrunPolicy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.scheduler.shutdown_timeout_ms, 30_000);
        assert_eq!(config.logging.level, "info");
        assert!(config.jobs.is_empty());
    }

    #[test]
    fn test_load_full_config() {
        let content = r#"
            [scheduler]
            shutdown_timeout_ms = 5000
            overrun = "skip"

            [logging]
            level = "debug"
            file_dir = "/var/log/tickwork"

            [[jobs]]
            id = "heartbeat"
            kind = "heartbeat"
            interval_secs = 10

            [[jobs]]
            id = "import"
            kind = "flaky"
            timeout_ms = 2000
            enabled = false

            [jobs.retry]
            max_attempts = 5
            delay_ms = 250
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.scheduler.shutdown_timeout_ms, 5000);
        assert_eq!(config.scheduler.overrun, OverrunPolicy::Skip);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file_dir.as_deref(), Some("/var/log/tickwork"));
        assert_eq!(config.jobs.len(), 2);
        assert_eq!(config.jobs[0].id, "heartbeat");
        assert_eq!(config.jobs[0].interval_secs, Some(10));
        assert!(!config.jobs[1].enabled);
        assert_eq!(config.jobs[1].retry.max_attempts, 5);
        assert_eq!(config.jobs[1].retry.delay_ms, 250);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[scheduler]").unwrap();
        writeln!(file, "shutdown_timeout_ms = 1200").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.scheduler.shutdown_timeout_ms, 1200);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/tickwork.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config =
            ConfigLoader::load_or_default(Path::new("/nonexistent/path/tickwork.toml")).unwrap();
        assert!(config.jobs.is_empty());
    }

    #[test]
    fn test_load_or_default_keeps_parse_errors() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "jobs = [unclosed").unwrap();
        let result = ConfigLoader::load_or_default(file.path());
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(result.is_err());
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("TICKWORK_TEST_LOG_LEVEL", "warn");
        }
        let config = ConfigLoader::load_str(
            r#"
            [logging]
            level = "${TICKWORK_TEST_LOG_LEVEL}"
        "#,
        )
        .unwrap();
        assert_eq!(config.logging.level, "warn");
        unsafe {
            std::env::remove_var("TICKWORK_TEST_LOG_LEVEL");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${NONEXISTENT_TICKWORK_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(name)) if name == "NONEXISTENT_TICKWORK_VAR_12345"));
    }

    #[test]
    fn test_expand_env_vars_no_vars() {
        let content = "value = \"no variables here\"";
        let expanded = ConfigLoader::expand_env_vars(content).unwrap();
        assert_eq!(expanded, content);
    }

    #[test]
    fn test_expand_path_no_tilde() {
        let path = "/usr/local/var/log";
        assert_eq!(ConfigLoader::expand_path(path), path);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/.tickwork/logs");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/.tickwork/logs"));
    }
}
