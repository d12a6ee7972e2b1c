//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use wf_core::{Config, Run, RunStore, StepStatus};
use wf_db::{Database, DuckDbBackend};
use wf_pipeline::{LogObserver, Pipeline, RunOutcome, RunStoreObserver};

use crate::cli::GlobalArgs;

/// Non-zero process exit without an error message.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that destructors run (the DuckDB file is closed cleanly).
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Not user-facing: main turns this into the process exit status
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// A loaded project: its directory and configuration
pub(crate) struct Project {
    pub root: PathBuf,
    pub config: Config,
}

impl Project {
    pub fn run_store(&self) -> RunStore {
        RunStore::new(&self.config.state_path_absolute(&self.root))
    }
}

/// Load the project from `--project-dir`, or from `--config` when given
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let root = PathBuf::from(&global.project_dir);
    let config = match &global.config {
        Some(path) => Config::load(Path::new(path)),
        None => Config::load_from_dir(&root),
    }
    .context("Failed to load pipeline configuration")?;

    if global.verbose {
        eprintln!(
            "[verbose] Loaded pipeline '{}' from {}",
            config.name,
            root.display()
        );
    }
    Ok(Project { root, config })
}

/// Open the one store connection a command shares between all its parts
pub(crate) fn open_database(
    project: &Project,
    database_override: Option<&str>,
    verbose: bool,
) -> Result<Arc<dyn Database>> {
    let db_path = project
        .config
        .resolve_database_path(database_override, &project.root);
    if let Some(parent) = Path::new(&db_path).parent() {
        if db_path != ":memory:" && !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    if verbose {
        eprintln!("[verbose] Database: {}", db_path);
    }

    let db: Arc<dyn Database> =
        Arc::new(DuckDbBackend::new(&db_path).context("Failed to connect to database")?);
    Ok(db)
}

/// Pipeline with logging and run persistence attached
pub(crate) fn build_pipeline(
    project: &Project,
    dataset_override: Option<&str>,
    db: Arc<dyn Database>,
    no_retry_delay: bool,
) -> Pipeline {
    let mut retry = project.config.retry;
    if no_retry_delay {
        retry = wf_core::RetryPolicy::new(retry.max_retries, Duration::ZERO);
    }

    Pipeline::from_config(&project.config, &project.root, dataset_override, db)
        .with_retry(retry)
        .with_observer(Arc::new(LogObserver))
        .with_observer(Arc::new(RunStoreObserver::new(project.run_store())))
}

/// Status marker used in step listings
pub(crate) fn step_marker(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Succeeded => "✓",
        StepStatus::Failed => "✗",
        StepStatus::Skipped => "-",
        StepStatus::Pending | StepStatus::Running | StepStatus::UpForRetry => "…",
    }
}

/// One line per step, then the run summary
pub(crate) fn print_run(run: &Run) {
    for record in &run.steps {
        let mut line = format!(
            "  {} {:<15} {}",
            step_marker(record.status),
            record.step.task_id(),
            record.status
        );
        if record.attempts > 0 {
            line.push_str(&format!(
                " ({} attempt{}, {}ms)",
                record.attempts,
                if record.attempts == 1 { "" } else { "s" },
                record.duration_ms.unwrap_or(0)
            ));
        }
        println!("{}", line);
        if record.status == StepStatus::Failed {
            if let Some(error) = &record.error {
                println!("      {}", error);
            }
        }
    }
}

/// Print an outcome and turn a failed run into exit code 1
pub(crate) fn report_outcome(outcome: &RunOutcome) -> Result<()> {
    print_run(&outcome.run);
    let summary = outcome.run.summary();
    println!();
    println!(
        "Completed: {} succeeded, {} failed, {} skipped",
        summary.succeeded, summary.failed, summary.skipped
    );
    println!("Total time: {}ms", summary.total_duration_ms);

    if outcome.succeeded() {
        Ok(())
    } else {
        Err(ExitCode(1).into())
    }
}
