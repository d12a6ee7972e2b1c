//! Per-run state machine and run history
//!
//! A [`Run`] walks a strictly linear phase chain:
//!
//! ```text
//! Pending → ExtractRunning → ExtractDone | ExtractFailed
//! ExtractDone → LoadRunning → LoadDone | LoadFailed
//! LoadDone → TransformRunning → TransformDone | TransformFailed
//! ```
//!
//! Every mutation goes through a transition method that rejects out-of-order
//! moves, so a step can never start unless its predecessor is Done in the
//! same run. Runs are persisted as JSON for audit and for the scheduler's
//! "already ran this interval" check.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::step::StepId;

/// What created the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunTrigger {
    Scheduled,
    Manual,
}

/// Overall status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// Status of one step within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    /// Last attempt failed, another one is scheduled
    UpForRetry,
    Succeeded,
    Failed,
    /// Never started because an upstream step failed
    Skipped,
}

/// Position of a run in the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Pending,
    Running(StepId),
    Done(StepId),
    Failed(StepId),
}

impl RunPhase {
    /// `TransformDone` or any failure
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Failed(_) | RunPhase::Done(StepId::Transform))
    }

    /// Whether `step` may start from this phase
    fn admits(&self, step: StepId) -> bool {
        match step.predecessor() {
            None => *self == RunPhase::Pending,
            Some(pred) => *self == RunPhase::Done(pred),
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Pending => write!(f, "pending"),
            RunPhase::Running(step) => write!(f, "{}_running", step),
            RunPhase::Done(step) => write!(f, "{}_done", step),
            RunPhase::Failed(step) => write!(f, "{}_failed", step),
        }
    }
}

/// Record of one step's execution within a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: StepId,
    pub status: StepStatus,

    /// Attempts made so far (first execution included)
    pub attempts: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    /// Wall time from first attempt to completion, retry delays included
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    /// Most recent error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepRecord {
    fn pending(step: StepId) -> Self {
        Self {
            step,
            status: StepStatus::Pending,
            attempts: 0,
            started_at: None,
            finished_at: None,
            duration_ms: None,
            error: None,
        }
    }

    fn finish(&mut self, status: StepStatus) {
        let now = Utc::now();
        self.status = status;
        self.finished_at = Some(now);
        self.duration_ms = self
            .started_at
            .map(|started| (now - started).num_milliseconds().max(0) as u64);
    }
}

/// One execution of the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub run_id: String,
    pub pipeline: String,

    /// Start of the interval this run covers
    pub logical_date: DateTime<Utc>,

    pub trigger: RunTrigger,
    pub status: RunStatus,
    pub phase: RunPhase,

    /// One record per step, in execution order
    pub steps: Vec<StepRecord>,

    /// Fingerprint of the pipeline config the run used
    pub config_hash: String,

    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Run {
    /// Create a pending run
    pub fn new(
        pipeline: impl Into<String>,
        logical_date: DateTime<Utc>,
        trigger: RunTrigger,
        config_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4().to_string()[..8].to_string(),
            pipeline: pipeline.into(),
            logical_date,
            trigger,
            status: RunStatus::Pending,
            phase: RunPhase::Pending,
            steps: StepId::ALL.iter().map(|s| StepRecord::pending(*s)).collect(),
            config_hash: config_hash.into(),
            created_at: now,
            last_updated_at: now,
            finished_at: None,
        }
    }

    /// Record for `step`
    pub fn step(&self, step: StepId) -> &StepRecord {
        // `steps` is built from StepId::ALL in order
        &self.steps[step as usize]
    }

    fn step_mut(&mut self, step: StepId) -> &mut StepRecord {
        &mut self.steps[step as usize]
    }

    fn transition_error(&self, to: RunPhase) -> CoreError {
        CoreError::InvalidTransition {
            from: self.phase.to_string(),
            to: to.to_string(),
        }
    }

    fn require_running(&self, step: StepId, to: RunPhase) -> CoreResult<()> {
        if self.phase == RunPhase::Running(step) {
            Ok(())
        } else {
            Err(self.transition_error(to))
        }
    }

    fn touch(&mut self) {
        self.last_updated_at = Utc::now();
    }

    /// Move `step` into its Running phase.
    ///
    /// Fails unless the run is Pending (for extract) or the direct
    /// predecessor is Done.
    pub fn start_step(&mut self, step: StepId) -> CoreResult<()> {
        let to = RunPhase::Running(step);
        if !self.phase.admits(step) {
            return Err(self.transition_error(to));
        }
        self.phase = to;
        self.status = RunStatus::Running;
        let record = self.step_mut(step);
        record.status = StepStatus::Running;
        record.started_at = Some(Utc::now());
        self.touch();
        Ok(())
    }

    /// Count a new attempt of the running step, returning its 1-based number
    pub fn begin_attempt(&mut self, step: StepId) -> CoreResult<u32> {
        self.require_running(step, RunPhase::Running(step))?;
        let record = self.step_mut(step);
        record.attempts += 1;
        record.status = StepStatus::Running;
        let attempt = record.attempts;
        self.touch();
        Ok(attempt)
    }

    /// Record a failed attempt that will be retried
    pub fn schedule_retry(&mut self, step: StepId, error: &str) -> CoreResult<()> {
        self.require_running(step, RunPhase::Running(step))?;
        let record = self.step_mut(step);
        record.status = StepStatus::UpForRetry;
        record.error = Some(error.to_string());
        self.touch();
        Ok(())
    }

    /// Mark the running step Done; completing transform finishes the run
    pub fn complete_step(&mut self, step: StepId) -> CoreResult<()> {
        let to = RunPhase::Done(step);
        self.require_running(step, to)?;
        self.phase = to;
        let record = self.step_mut(step);
        record.finish(StepStatus::Succeeded);
        record.error = None;
        if to.is_terminal() {
            self.status = RunStatus::Succeeded;
            self.finished_at = Some(Utc::now());
        }
        self.touch();
        Ok(())
    }

    /// Mark the running step Failed, skip everything downstream and fail the run
    pub fn fail_step(&mut self, step: StepId, error: &str) -> CoreResult<()> {
        let to = RunPhase::Failed(step);
        self.require_running(step, to)?;
        self.phase = to;
        let record = self.step_mut(step);
        record.finish(StepStatus::Failed);
        record.error = Some(error.to_string());
        for downstream in step.downstream() {
            self.step_mut(*downstream).status = StepStatus::Skipped;
        }
        self.status = RunStatus::Failed;
        self.finished_at = Some(Utc::now());
        self.touch();
        Ok(())
    }

    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Succeeded
    }

    /// Summary statistics
    pub fn summary(&self) -> RunSummary {
        let count = |status: StepStatus| self.steps.iter().filter(|s| s.status == status).count();
        RunSummary {
            succeeded: count(StepStatus::Succeeded),
            failed: count(StepStatus::Failed),
            skipped: count(StepStatus::Skipped),
            total_attempts: self.steps.iter().map(|s| s.attempts).sum(),
            total_duration_ms: self.steps.iter().filter_map(|s| s.duration_ms).sum(),
        }
    }

    /// Load a run from a file path
    pub fn load(path: &Path) -> CoreResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let run = serde_json::from_str(&content).map_err(|e| CoreError::CorruptRunState {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(run))
    }

    /// Save the run to a file path atomically
    ///
    /// Uses write-to-temp-then-rename so readers never see a partial file
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }
}

/// Summary statistics for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_attempts: u32,
    pub total_duration_ms: u64,
}

/// Directory of persisted runs, one JSON file per run
#[derive(Debug, Clone)]
pub struct RunStore {
    dir: PathBuf,
}

impl RunStore {
    /// Store rooted at `<state_dir>/runs`
    pub fn new(state_dir: &Path) -> Self {
        Self {
            dir: state_dir.join("runs"),
        }
    }

    /// File a run is written to
    pub fn path_for(&self, run: &Run) -> PathBuf {
        self.dir.join(format!(
            "{}__{}.json",
            run.logical_date.format("%Y%m%dT%H%M%S"),
            run.run_id
        ))
    }

    pub fn save(&self, run: &Run) -> CoreResult<PathBuf> {
        let path = self.path_for(run);
        run.save(&path)?;
        Ok(path)
    }

    /// All readable runs, oldest logical date first.
    ///
    /// Unreadable files are logged and skipped so one corrupt file does not
    /// hide the rest of the history.
    pub fn list(&self) -> CoreResult<Vec<Run>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            match Run::load(&path) {
                Ok(Some(run)) => runs.push(run),
                Ok(None) => {}
                Err(e) => log::warn!("Skipping run file {}: {}", path.display(), e),
            }
        }

        runs.sort_by(|a, b| {
            a.logical_date
                .cmp(&b.logical_date)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(runs)
    }

    /// Most recent runs, newest first
    pub fn recent(&self, limit: usize) -> CoreResult<Vec<Run>> {
        let mut runs = self.list()?;
        runs.reverse();
        runs.truncate(limit);
        Ok(runs)
    }

    /// Scheduled run with the latest logical date
    pub fn latest_scheduled(&self) -> CoreResult<Option<Run>> {
        Ok(self
            .list()?
            .into_iter()
            .rev()
            .find(|r| r.trigger == RunTrigger::Scheduled))
    }

    /// Whether a scheduled run (in any state) exists for `logical_date`.
    ///
    /// Manual runs share logical dates with scheduled ones but never claim
    /// an interval.
    pub fn has_scheduled_run_for(&self, logical_date: DateTime<Utc>) -> CoreResult<bool> {
        Ok(self
            .list()?
            .iter()
            .any(|r| r.trigger == RunTrigger::Scheduled && r.logical_date == logical_date))
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Pending => write!(f, "pending"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Succeeded => write!(f, "succeeded"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Pending => write!(f, "pending"),
            StepStatus::Running => write!(f, "running"),
            StepStatus::UpForRetry => write!(f, "up_for_retry"),
            StepStatus::Succeeded => write!(f, "succeeded"),
            StepStatus::Failed => write!(f, "failed"),
            StepStatus::Skipped => write!(f, "skipped"),
        }
    }
}

impl fmt::Display for RunTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunTrigger::Scheduled => write!(f, "scheduled"),
            RunTrigger::Manual => write!(f, "manual"),
        }
    }
}

#[cfg(test)]
#[path = "run_state_test.rs"]
mod tests;
