//! Run command implementation

use anyhow::{Context, Result};
use chrono::{NaiveTime, Utc};
use serde::Serialize;

use wf_core::{Run, RunTrigger};

use crate::cli::{GlobalArgs, OutputFormat, RunArgs};
use crate::commands::common::{build_pipeline, load_project, open_database, report_outcome, ExitCode};

/// JSON shape of `wf run --output json`
#[derive(Serialize)]
struct RunReport<'a> {
    run: &'a Run,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Execute the run command
pub async fn execute(args: &RunArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let db = open_database(&project, args.database.as_deref(), global.verbose)?;
    let pipeline = build_pipeline(
        &project,
        args.dataset.as_deref(),
        db,
        args.no_retry_delay,
    );

    let logical_date = args
        .logical_date
        .unwrap_or_else(|| Utc::now().date_naive())
        .and_time(NaiveTime::MIN)
        .and_utc();

    if global.verbose {
        eprintln!(
            "[verbose] Retry policy: {} retries, {}s delay",
            pipeline.retry().max_retries,
            pipeline.retry().delay_secs
        );
    }
    if args.output == OutputFormat::Table {
        println!(
            "Running {} for {}\n",
            pipeline.name(),
            logical_date.format("%Y-%m-%d")
        );
    }

    let outcome = pipeline
        .trigger(logical_date, RunTrigger::Manual)
        .await
        .context("Run bookkeeping failed")?;

    match args.output {
        OutputFormat::Table => report_outcome(&outcome),
        OutputFormat::Json => {
            let report = RunReport {
                run: &outcome.run,
                error: outcome.failure.as_ref().map(|f| f.error.to_string()),
            };
            let json =
                serde_json::to_string_pretty(&report).context("Failed to serialize to JSON")?;
            println!("{}", json);
            if outcome.succeeded() {
                Ok(())
            } else {
                Err(ExitCode(1).into())
            }
        }
    }
}
