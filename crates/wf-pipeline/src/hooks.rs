//! Run lifecycle hooks
//!
//! The orchestrator reports every state change to its observers. Hooks are
//! synchronous and cannot fail the run; an observer that hits an error logs
//! it and carries on.

use std::time::Duration;

use wf_core::{Run, RunStore, StepId};

use crate::error::PipelineError;

/// Receives run and step transitions. All methods default to no-ops.
pub trait RunObserver: Send + Sync {
    fn run_started(&self, _run: &Run) {}

    fn step_started(&self, _run: &Run, _step: StepId) {}

    /// An attempt failed and another one follows after `delay`
    fn step_retrying(
        &self,
        _run: &Run,
        _step: StepId,
        _attempt: u32,
        _error: &PipelineError,
        _delay: Duration,
    ) {
    }

    fn step_succeeded(&self, _run: &Run, _step: StepId) {}

    /// Retries are exhausted; downstream steps are already marked skipped
    fn step_failed(&self, _run: &Run, _step: StepId, _error: &PipelineError) {}

    fn run_finished(&self, _run: &Run) {}
}

/// Writes diagnostic lines through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl RunObserver for LogObserver {
    fn run_started(&self, run: &Run) {
        log::info!(
            "Run {} of {} started ({} trigger, logical date {})",
            run.run_id,
            run.pipeline,
            run.trigger,
            run.logical_date.format("%Y-%m-%d %H:%M")
        );
    }

    fn step_started(&self, run: &Run, step: StepId) {
        log::info!("[{}] Task {} started", run.run_id, step.task_id());
    }

    fn step_retrying(
        &self,
        run: &Run,
        step: StepId,
        attempt: u32,
        error: &PipelineError,
        delay: Duration,
    ) {
        log::warn!(
            "[{}] Task {} attempt {} failed, retrying in {}s: {}",
            run.run_id,
            step.task_id(),
            attempt,
            delay.as_secs(),
            error
        );
    }

    fn step_succeeded(&self, run: &Run, step: StepId) {
        let record = run.step(step);
        log::info!(
            "[{}] Task {} succeeded after {} attempt(s) in {}ms",
            run.run_id,
            step.task_id(),
            record.attempts,
            record.duration_ms.unwrap_or(0)
        );
    }

    fn step_failed(&self, run: &Run, step: StepId, error: &PipelineError) {
        log::error!(
            "[{}] Task {} failed after {} attempt(s): {}",
            run.run_id,
            step.task_id(),
            run.step(step).attempts,
            error
        );
    }

    fn run_finished(&self, run: &Run) {
        let summary = run.summary();
        if run.succeeded() {
            log::info!(
                "Run {} succeeded ({} attempts, {}ms)",
                run.run_id,
                summary.total_attempts,
                summary.total_duration_ms
            );
        } else {
            log::error!(
                "Run {} failed at {} ({} skipped)",
                run.run_id,
                run.phase,
                summary.skipped
            );
        }
    }
}

/// Persists the run to a [`RunStore`] on every transition
#[derive(Debug, Clone)]
pub struct RunStoreObserver {
    store: RunStore,
}

impl RunStoreObserver {
    pub fn new(store: RunStore) -> Self {
        Self { store }
    }

    fn persist(&self, run: &Run) {
        if let Err(e) = self.store.save(run) {
            log::warn!("Failed to persist run {}: {}", run.run_id, e);
        }
    }
}

impl RunObserver for RunStoreObserver {
    fn run_started(&self, run: &Run) {
        self.persist(run);
    }

    fn step_started(&self, run: &Run, _step: StepId) {
        self.persist(run);
    }

    fn step_retrying(
        &self,
        run: &Run,
        _step: StepId,
        _attempt: u32,
        _error: &PipelineError,
        _delay: Duration,
    ) {
        self.persist(run);
    }

    fn step_succeeded(&self, run: &Run, _step: StepId) {
        self.persist(run);
    }

    fn step_failed(&self, run: &Run, _step: StepId, _error: &PipelineError) {
        self.persist(run);
    }

    fn run_finished(&self, run: &Run) {
        self.persist(run);
    }
}
