//! Job scheduler: one cancellable loop per registered job.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::FutureExt;
use parking_lot::Mutex;
use tickwork_config::{OverrunPolicy, SchedulerConfig};
use tickwork_core::{
    CancellationToken, InMemoryJobStore, JobDescriptor, JobError, JobResolver, JobResult,
    JobStatus, JobStore, panic_message,
};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::DropGuard;
use tracing::{debug, error, info, warn};

use crate::error::SchedulerError;
use crate::runner::JobRunner;

/// Where a job's loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobLoopState {
    /// Registered, loop not started.
    Idle,
    /// Waiting for the next execution.
    Waiting,
    /// Executing.
    Executing,
    /// Loop has exited.
    Terminated,
}

/// Per-job execution statistics.
///
/// Executions interrupted by cancellation are not counted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobStats {
    pub runs: u64,
    pub successes: u64,
    pub failures: u64,
    pub last_status: Option<JobStatus>,
    pub last_error: Option<String>,
    pub last_finished_at: Option<DateTime<Utc>>,
}

/// Outcome of [`JobScheduler::shutdown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Loops that exited before the deadline.
    pub drained: usize,
    /// Loops aborted at the deadline.
    pub aborted: usize,
}

#[derive(Debug)]
struct LoopStatus {
    state: JobLoopState,
    stats: JobStats,
    /// Generation of the loop that owns `state`. Bumped on every spawn.
    generation: u64,
    /// Cancelled when the latest loop for this job has exited.
    exited: Option<CancellationToken>,
}

impl Default for LoopStatus {
    fn default() -> Self {
        Self {
            state: JobLoopState::Idle,
            stats: JobStats::default(),
            generation: 0,
            exited: None,
        }
    }
}

type StatusTable = Arc<DashMap<String, LoopStatus>>;

struct RunState {
    cancel: CancellationToken,
    runtime: Handle,
    loops: Vec<(String, JoinHandle<()>)>,
}

/// Schedules registered jobs.
///
/// Each job gets its own Tokio task. A one-time job runs once immediately; a
/// recurring job waits its interval before every execution, with overruns
/// handled per [`OverrunPolicy`]. Dropping the scheduler cancels every loop.
pub struct JobScheduler {
    config: SchedulerConfig,
    store: Arc<dyn JobStore>,
    runner: Arc<JobRunner>,
    status: StatusTable,
    run: Mutex<Option<RunState>>,
}

impl JobScheduler {
    /// Create a scheduler with an in-memory store.
    pub fn new(config: SchedulerConfig, resolver: Arc<dyn JobResolver>) -> Self {
        Self::with_store(config, Arc::new(InMemoryJobStore::new()), resolver)
    }

    /// Create a scheduler over an existing store. Descriptors already in the
    /// store count as registered.
    pub fn with_store(
        config: SchedulerConfig,
        store: Arc<dyn JobStore>,
        resolver: Arc<dyn JobResolver>,
    ) -> Self {
        let status: StatusTable = Arc::new(DashMap::new());
        for descriptor in store.get_all() {
            status.insert(descriptor.id().to_string(), LoopStatus::default());
        }

        Self {
            config,
            store,
            runner: Arc::new(JobRunner::new(resolver)),
            status,
            run: Mutex::new(None),
        }
    }

    /// Register a job.
    ///
    /// Returns `false` without changing anything when a job with the same ID
    /// is already registered. When the scheduler is running, the new job's
    /// loop starts right away.
    pub fn register(&self, descriptor: JobDescriptor) -> bool {
        let descriptor = Arc::new(descriptor);
        // Held across the store write and the spawn so `start` never sees a
        // stored job without also spawning it exactly once.
        let mut run = self.run.lock();

        if self.store.get(descriptor.id()).is_some() {
            debug!(job_id = %descriptor.id(), "Job already registered, ignoring");
            return false;
        }

        self.store.save(descriptor.clone());
        self.status
            .insert(descriptor.id().to_string(), LoopStatus::default());
        info!(
            job_id = %descriptor.id(),
            job_type = %descriptor.job_type(),
            recurring = descriptor.is_recurring(),
            "Job registered"
        );

        if let Some(state) = run.as_mut().filter(|s| !s.cancel.is_cancelled()) {
            self.spawn_loop(state, descriptor);
        }
        true
    }

    /// Start a loop for every registered job.
    ///
    /// Loops stop when `stop`/`shutdown` is called or when `parent` is cancelled.
    /// A job whose loop from a previous run is still executing waits for it
    /// to exit before its new loop proceeds.
    pub fn start(&self, parent: Option<&CancellationToken>) -> Result<(), SchedulerError> {
        let runtime = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
        let mut run = self.run.lock();

        if run.as_ref().is_some_and(|s| !s.cancel.is_cancelled()) {
            return Err(SchedulerError::AlreadyRunning);
        }

        // Loops of a previous run may still be winding down; keep tracking them.
        let mut loops = run.take().map(|s| s.loops).unwrap_or_default();
        loops.retain(|(_, handle)| !handle.is_finished());

        let mut state = RunState {
            cancel: parent.map(CancellationToken::child_token).unwrap_or_default(),
            runtime,
            loops,
        };

        let descriptors = self.store.get_all();
        for descriptor in &descriptors {
            self.spawn_loop(&mut state, descriptor.clone());
        }

        info!(
            jobs = descriptors.len(),
            overrun = ?self.config.overrun,
            "Scheduler started"
        );
        *run = Some(state);
        Ok(())
    }

    /// Signal every loop to stop. Does not wait for them.
    pub fn stop(&self) {
        if let Some(state) = self.run.lock().as_ref() {
            state.cancel.cancel();
            info!("Scheduler stopping");
        }
    }

    /// Stop and wait for every loop to exit, up to the configured shutdown
    /// timeout. Loops still running at the deadline are aborted.
    pub async fn shutdown(&self) -> ShutdownReport {
        let loops = {
            let mut run = self.run.lock();
            match run.take() {
                Some(state) => {
                    state.cancel.cancel();
                    state.loops
                }
                None => return ShutdownReport::default(),
            }
        };

        let deadline = Instant::now() + self.config.shutdown_timeout();
        let mut report = ShutdownReport::default();

        for (job_id, mut handle) in loops {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(_) => report.drained += 1,
                Err(_) => {
                    handle.abort();
                    if let Some(mut entry) = self.status.get_mut(&job_id) {
                        entry.state = JobLoopState::Terminated;
                    }
                    warn!(job_id = %job_id, "Job loop did not stop in time, aborted");
                    report.aborted += 1;
                }
            }
        }

        info!(
            drained = report.drained,
            aborted = report.aborted,
            "Scheduler shut down"
        );
        report
    }

    /// Whether loops are running and have not been told to stop.
    pub fn is_running(&self) -> bool {
        self.run
            .lock()
            .as_ref()
            .is_some_and(|s| !s.cancel.is_cancelled())
    }

    /// IDs of every registered job, sorted.
    pub fn job_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .store
            .get_all()
            .iter()
            .map(|d| d.id().to_string())
            .collect();
        ids.sort();
        ids
    }

    pub fn job_state(&self, job_id: &str) -> Option<JobLoopState> {
        self.status.get(job_id).map(|s| s.state)
    }

    pub fn job_stats(&self, job_id: &str) -> Option<JobStats> {
        self.status.get(job_id).map(|s| s.stats.clone())
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    /// Callers hold the run lock, so generations of one job never race.
    fn spawn_loop(&self, state: &mut RunState, descriptor: Arc<JobDescriptor>) {
        let job_id = descriptor.id().to_string();
        let exited = CancellationToken::new();
        let (generation, predecessor) = {
            let mut entry = self.status.entry(job_id.clone()).or_default();
            entry.generation += 1;
            let predecessor = entry
                .exited
                .replace(exited.clone())
                .filter(|token| !token.is_cancelled());
            (entry.generation, predecessor)
        };
        if predecessor.is_some() {
            debug!(job_id = %job_id, "Previous loop still running, new loop will wait for it");
        }

        let job_loop = JobLoop {
            descriptor,
            runner: self.runner.clone(),
            status: self.status.clone(),
            cancel: state.cancel.clone(),
            overrun: self.config.overrun,
            generation,
            predecessor,
            exited,
        };
        let handle = state.runtime.spawn(job_loop.run());
        state.loops.push((job_id, handle));
    }
}

impl Drop for JobScheduler {
    fn drop(&mut self) {
        if let Some(state) = self.run.get_mut().as_ref() {
            state.cancel.cancel();
        }
    }
}

struct JobLoop {
    descriptor: Arc<JobDescriptor>,
    runner: Arc<JobRunner>,
    status: StatusTable,
    cancel: CancellationToken,
    overrun: OverrunPolicy,
    generation: u64,
    /// Exit latch of the loop this one replaces, if it had not exited yet.
    predecessor: Option<CancellationToken>,
    exited: CancellationToken,
}

impl JobLoop {
    async fn run(self) {
        // Fires on return, abort or panic alike.
        let _exited: DropGuard = self.exited.clone().drop_guard();

        self.set_state(JobLoopState::Waiting);
        if self.await_predecessor().await {
            self.iterate().await;
        }

        self.set_state(JobLoopState::Terminated);
        debug!(job_id = %self.descriptor.id(), generation = self.generation, "Job loop exited");
    }

    /// Returns `false` when cancelled before the previous loop exited.
    async fn await_predecessor(&self) -> bool {
        let Some(previous) = &self.predecessor else {
            return true;
        };
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = previous.cancelled() => true,
        }
    }

    async fn iterate(&self) {
        let mut ticker = self.ticker();

        loop {
            self.set_state(JobLoopState::Waiting);
            if !self.wait_next(ticker.as_mut()).await {
                break;
            }

            self.set_state(JobLoopState::Executing);
            self.execute_once().await;

            if !self.descriptor.is_recurring() || self.cancel.is_cancelled() {
                break;
            }
        }
    }

    /// Fixed-cadence ticker for recurring jobs that do not use fixed delay.
    ///
    /// Intervals too large for the clock fall back to plain sleeps.
    fn ticker(&self) -> Option<Interval> {
        let interval = self.descriptor.recurrence_interval()?;
        let behavior = match self.overrun {
            OverrunPolicy::FixedDelay => return None,
            OverrunPolicy::Skip => MissedTickBehavior::Skip,
            OverrunPolicy::Burst => MissedTickBehavior::Burst,
        };
        let start = Instant::now().checked_add(interval)?;
        start.checked_add(interval)?;
        let mut ticker = tokio::time::interval_at(start, interval);
        ticker.set_missed_tick_behavior(behavior);
        Some(ticker)
    }

    /// Returns `false` when cancelled first.
    async fn wait_next(&self, ticker: Option<&mut Interval>) -> bool {
        if let Some(ticker) = ticker {
            return tokio::select! {
                biased;
                _ = self.cancel.cancelled() => false,
                _ = ticker.tick() => true,
            };
        }

        let delay = self.descriptor.next_delay();
        if delay.is_zero() {
            return !self.cancel.is_cancelled();
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    async fn execute_once(&self) {
        let job_id = self.descriptor.id();
        let outcome = AssertUnwindSafe(self.runner.run(&self.descriptor, &self.cancel))
            .catch_unwind()
            .await;

        let result = match outcome {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(&*payload);
                error!(job_id = %job_id, panic = %message, "Job iteration panicked");
                JobResult::failed(JobError::Panicked(message))
            }
        };

        match result.cause() {
            Some(cause) if cause.is_cancelled() => {
                debug!(job_id = %job_id, "Job execution cancelled");
                return;
            }
            Some(cause) => {
                warn!(job_id = %job_id, status = %result.status(), error = %cause, "Job finished")
            }
            None => info!(job_id = %job_id, status = %result.status(), "Job finished"),
        }

        self.record(&result);
    }

    fn record(&self, result: &JobResult) {
        let Some(mut entry) = self.status.get_mut(self.descriptor.id()) else {
            return;
        };
        let stats = &mut entry.stats;
        stats.runs += 1;
        if result.is_success() {
            stats.successes += 1;
        } else {
            stats.failures += 1;
        }
        stats.last_status = Some(result.status());
        stats.last_error = result.cause().map(ToString::to_string);
        stats.last_finished_at = Some(Utc::now());
    }

    /// Only the newest loop of a job owns its state.
    fn set_state(&self, state: JobLoopState) {
        if let Some(mut entry) = self.status.get_mut(self.descriptor.id()) {
            if entry.generation == self.generation {
                entry.state = state;
            }
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
