//! Schedule command implementation

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;

use wf_pipeline::{Scheduler, TickOutcome};

use crate::cli::{GlobalArgs, ScheduleArgs};
use crate::commands::common::{build_pipeline, load_project, open_database, report_outcome};

/// Execute the schedule command
pub async fn execute(args: &ScheduleArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let db = open_database(&project, args.database.as_deref(), global.verbose)?;
    let pipeline = Arc::new(build_pipeline(
        &project,
        args.dataset.as_deref(),
        db,
        false,
    ));
    let schedule = project
        .config
        .schedule
        .schedule()
        .context("Invalid schedule")?;
    let scheduler = Scheduler::new(pipeline, schedule, project.run_store());

    if global.verbose {
        eprintln!(
            "[verbose] Schedule: {} from {}",
            scheduler.schedule(),
            scheduler.schedule().start().format("%Y-%m-%d")
        );
    }

    if args.once {
        return match scheduler
            .tick(Utc::now())
            .await
            .context("Scheduler tick failed")?
        {
            TickOutcome::NotDue => {
                println!("No interval has closed yet.");
                Ok(())
            }
            TickOutcome::AlreadyRan(logical_date) => {
                println!(
                    "Interval {} already ran.",
                    logical_date.format("%Y-%m-%d %H:%M")
                );
                Ok(())
            }
            TickOutcome::Ran(outcome) => report_outcome(&outcome),
        };
    }

    println!(
        "Scheduling {} ({}); press Ctrl-C to stop",
        project.config.name,
        scheduler.schedule()
    );
    scheduler
        .run_forever(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for Ctrl-C: {}", e);
            }
        })
        .await
        .context("Scheduler stopped with an error")?;
    Ok(())
}
