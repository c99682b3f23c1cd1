//! Tickwork - in-process recurring job engine
//!
//! Main entry point: loads the configuration, registers the configured jobs
//! and runs them until Ctrl-C.

mod cli;
mod jobs;
mod register;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use tickwork_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig};
use tickwork_core::{CancellationToken, JobRegistry, JobType};
use tickwork_scheduler::JobScheduler;

use cli::{Cli, Commands};

/// Get the .tickwork directory path.
fn tickwork_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".tickwork"))
        .unwrap_or_else(|| PathBuf::from(".tickwork"))
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = match &logging.file_dir {
        Some(dir) => PathBuf::from(ConfigLoader::expand_path(dir)),
        None => tickwork_dir().join("logs"),
    };
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("tickwork")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Dropping the guard stops the background writer.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = ConfigLoader::load_or_default(&cli.config)?;

    match cli.command {
        None => {
            init_tracing(&config.logging)?;
            run(&cli.config, config, None).await
        }
        Some(Commands::Run { duration_secs }) => {
            init_tracing(&config.logging)?;
            run(&cli.config, config, duration_secs.map(Duration::from_secs)).await
        }
        Some(Commands::Check) => check(&cli.config, &config),
        Some(Commands::Kinds) => {
            kinds();
            Ok(())
        }
    }
}

fn builtin_registry() -> Arc<JobRegistry> {
    let registry = Arc::new(JobRegistry::new());
    jobs::register_builtin_jobs(&registry);
    registry
}

/// Run the configured jobs until Ctrl-C or until `duration` elapses.
async fn run(
    config_path: &Path,
    config: Config,
    duration: Option<Duration>,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting Tickwork v{}", env!("CARGO_PKG_VERSION"));
    info!("Config file: {}", config_path.display());

    let validation = ConfigValidator::validate(&config)?;
    for warning in &validation.warnings {
        warn!(path = %warning.path, "{}", warning.message);
    }
    for err in &validation.errors {
        error!(path = %err.path, "{}", err.message);
    }
    validation.into_result()?;

    let scheduler = JobScheduler::new(config.scheduler.clone(), builtin_registry());
    let registered = register::register_configured_jobs(&scheduler, &config.jobs)?;
    if registered == 0 {
        warn!("No jobs configured");
    }

    let shutdown = CancellationToken::new();
    scheduler.start(Some(&shutdown))?;

    match duration {
        Some(duration) => {
            tokio::select! {
                _ = tokio::time::sleep(duration) => info!("Run duration elapsed"),
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    info!("Received Ctrl-C");
                }
            }
        }
        None => {
            tokio::signal::ctrl_c().await?;
            info!("Received Ctrl-C");
        }
    }

    info!("Shutting down (up to {:?})", scheduler.config().shutdown_timeout());
    let report = scheduler.shutdown().await;

    for job_id in scheduler.job_ids() {
        if let Some(stats) = scheduler.job_stats(&job_id) {
            info!(
                job_id = %job_id,
                runs = stats.runs,
                successes = stats.successes,
                failures = stats.failures,
                "Job summary"
            );
        }
    }
    info!(
        drained = report.drained,
        aborted = report.aborted,
        "Tickwork stopped"
    );
    Ok(())
}

/// Validate the configuration and print the findings.
fn check(config_path: &Path, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let validation = ConfigValidator::validate(config)?;
    let registry = builtin_registry();

    println!("Config: {}", config_path.display());
    println!("Jobs: {}", config.jobs.len());

    let mut problems = validation.errors.len();
    for err in &validation.errors {
        println!("  error   {}: {}", err.path, err.message);
    }
    for warning in &validation.warnings {
        println!("  warning {}: {}", warning.path, warning.message);
    }

    for (index, job) in config.jobs.iter().enumerate() {
        if !registry.contains(&JobType::new(job.kind.as_str())) {
            problems += 1;
            println!("  error   jobs[{}].kind: unknown kind '{}'", index, job.kind);
        }
    }

    if problems > 0 {
        return Err(format!("{} problem(s) found", problems).into());
    }
    println!("OK");
    Ok(())
}

fn kinds() {
    for job_type in builtin_registry().job_types() {
        println!("{}", job_type);
    }
}
