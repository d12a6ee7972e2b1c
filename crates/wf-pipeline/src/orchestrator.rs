//! Drives one run through extract, load and transform
//!
//! Each step gets `max_retries + 1` attempts with a fixed delay in between.
//! The first step to exhaust its attempts fails the run; everything after
//! it is marked skipped and never started.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use wf_core::{config_fingerprint, Config, RetryPolicy, Run, RunTrigger, StepId};
use wf_db::Database;

use crate::error::{PipelineError, PipelineResult};
use crate::hooks::RunObserver;
use crate::loader::RawLoader;
use crate::steps::{ExtractStep, LoadStep, TransformStep};
use crate::transform::TransformRunner;
use crate::validator::PathValidator;

/// The step that ended a run, with its final error
#[derive(Debug)]
pub struct StepFailure {
    pub step: StepId,
    pub attempts: u32,
    pub error: PipelineError,
}

/// Final state of a run plus the error that ended it, if any
#[derive(Debug)]
pub struct RunOutcome {
    pub run: Run,
    pub failure: Option<StepFailure>,
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none() && self.run.succeeded()
    }
}

enum StepOutcome<T> {
    Succeeded(T),
    Failed(StepFailure),
}

/// A configured extract → load → transform chain
pub struct Pipeline {
    name: String,
    extract: Arc<dyn ExtractStep>,
    load: Arc<dyn LoadStep>,
    transform: Arc<dyn TransformStep>,
    retry: RetryPolicy,
    observers: Vec<Arc<dyn RunObserver>>,
    config_hash: String,
    /// Held for the whole of a run so runs never overlap
    run_lock: Mutex<()>,
}

impl Pipeline {
    pub fn new(
        name: impl Into<String>,
        extract: Arc<dyn ExtractStep>,
        load: Arc<dyn LoadStep>,
        transform: Arc<dyn TransformStep>,
    ) -> Self {
        Self {
            name: name.into(),
            extract,
            load,
            transform,
            retry: RetryPolicy::default(),
            observers: Vec::new(),
            config_hash: String::new(),
            run_lock: Mutex::new(()),
        }
    }

    /// Assemble the HDHI chain from project configuration.
    ///
    /// `dataset_override` takes precedence over `WF_DATASET_PATH` and the
    /// configured path. All steps share `db`.
    pub fn from_config(
        config: &Config,
        root: &Path,
        dataset_override: Option<&str>,
        db: Arc<dyn Database>,
    ) -> Self {
        let extract = PathValidator::new(config.resolve_dataset_path(dataset_override, root));
        let load = RawLoader::from_config(db.clone(), config);
        let transform = TransformRunner::from_config(db, config, root);

        Self::new(
            config.name.clone(),
            Arc::new(extract),
            Arc::new(load),
            Arc::new(transform),
        )
        .with_retry(config.retry)
        .with_config_hash(config_fingerprint(config))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn with_config_hash(mut self, config_hash: impl Into<String>) -> Self {
        self.config_hash = config_hash.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Execute one complete run for `logical_date`.
    ///
    /// Waits for any run already in progress on this pipeline. A failed step
    /// is reported through the outcome, not as `Err`; `Err` means the run
    /// bookkeeping itself broke.
    pub async fn trigger(
        &self,
        logical_date: DateTime<Utc>,
        trigger: RunTrigger,
    ) -> PipelineResult<RunOutcome> {
        let _guard = self.run_lock.lock().await;

        let mut run = Run::new(&self.name, logical_date, trigger, &self.config_hash);
        self.notify(|o| o.run_started(&run));

        let failure = self.execute(&mut run).await?;

        self.notify(|o| o.run_finished(&run));
        Ok(RunOutcome { run, failure })
    }

    async fn execute(&self, run: &mut Run) -> PipelineResult<Option<StepFailure>> {
        let dataset = match self
            .execute_step(run, StepId::Extract, || self.extract.extract())
            .await?
        {
            StepOutcome::Succeeded(dataset) => dataset,
            StepOutcome::Failed(failure) => return Ok(Some(failure)),
        };

        match self
            .execute_step(run, StepId::Load, || self.load.load(&dataset))
            .await?
        {
            StepOutcome::Succeeded(summary) => {
                log::debug!("Loaded {} rows into {}", summary.rows, summary.table)
            }
            StepOutcome::Failed(failure) => return Ok(Some(failure)),
        }

        match self
            .execute_step(run, StepId::Transform, || self.transform.transform())
            .await?
        {
            StepOutcome::Succeeded(summary) => {
                log::debug!("Transform checksum {}", summary.checksum)
            }
            StepOutcome::Failed(failure) => return Ok(Some(failure)),
        }

        Ok(None)
    }

    /// Attempt `step` until it succeeds or the retry policy gives up
    async fn execute_step<T, F, Fut>(
        &self,
        run: &mut Run,
        step: StepId,
        mut attempt_fn: F,
    ) -> PipelineResult<StepOutcome<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = PipelineResult<T>>,
    {
        run.start_step(step)?;
        self.notify(|o| o.step_started(run, step));

        loop {
            let attempt = run.begin_attempt(step)?;
            log::debug!(
                "Task {} attempt {}/{}",
                step.task_id(),
                attempt,
                self.retry.max_attempts()
            );

            match attempt_fn().await {
                Ok(value) => {
                    run.complete_step(step)?;
                    self.notify(|o| o.step_succeeded(run, step));
                    return Ok(StepOutcome::Succeeded(value));
                }
                Err(error) if self.retry.should_retry(attempt) => {
                    let delay = self.retry.delay();
                    run.schedule_retry(step, &error.to_string())?;
                    self.notify(|o| o.step_retrying(run, step, attempt, &error, delay));
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(error) => {
                    run.fail_step(step, &error.to_string())?;
                    self.notify(|o| o.step_failed(run, step, &error));
                    return Ok(StepOutcome::Failed(StepFailure {
                        step,
                        attempts: attempt,
                        error,
                    }));
                }
            }
        }
    }

    fn notify(&self, f: impl Fn(&dyn RunObserver)) {
        for observer in &self.observers {
            f(observer.as_ref());
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
