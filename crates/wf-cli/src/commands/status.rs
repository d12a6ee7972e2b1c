//! Status command implementation

use anyhow::{Context, Result};

use wf_core::Run;
use wf_dashboard::render;

use crate::cli::{GlobalArgs, OutputFormat, StatusArgs};
use crate::commands::common::{load_project, print_run};

/// Execute the status command
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let state_dir = project.config.state_path_absolute(&project.root);
    let runs = project
        .run_store()
        .recent(args.limit)
        .context("Failed to read run history")?;

    if global.verbose {
        eprintln!("[verbose] State directory: {}", state_dir.display());
    }

    match args.output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&runs).context("Failed to serialize to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            if runs.is_empty() {
                println!("No runs recorded in {}", state_dir.display());
                return Ok(());
            }
            print!("{}", render::table(&RUN_HEADERS, &run_rows(&runs)));
            if let Some(latest) = runs.first() {
                println!("\nLatest run {}:", latest.run_id);
                print_run(latest);
            }
        }
    }
    Ok(())
}

const RUN_HEADERS: [&str; 6] = ["RUN", "LOGICAL DATE", "TRIGGER", "STATUS", "PHASE", "ATTEMPTS"];

fn run_rows(runs: &[Run]) -> Vec<Vec<String>> {
    runs.iter()
        .map(|run| {
            vec![
                run.run_id.clone(),
                run.logical_date.format("%Y-%m-%d %H:%M").to_string(),
                run.trigger.to_string(),
                run.status.to_string(),
                run.phase.to_string(),
                run.summary().total_attempts.to_string(),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use wf_core::{RunTrigger, StepId};

    #[test]
    fn test_run_rows() {
        let mut run = Run::new(
            "hdhi_elt_pipeline",
            Utc.with_ymd_and_hms(2025, 1, 3, 0, 0, 0).unwrap(),
            RunTrigger::Scheduled,
            "h",
        );
        run.start_step(StepId::Extract).unwrap();
        run.begin_attempt(StepId::Extract).unwrap();
        run.fail_step(StepId::Extract, "missing").unwrap();

        let rows = run_rows(&[run]);
        assert_eq!(rows[0][1], "2025-01-03 00:00");
        assert_eq!(rows[0][2], "scheduled");
        assert_eq!(rows[0][3], "failed");
        assert_eq!(rows[0][4], "extract_failed");
        assert_eq!(rows[0][5], "1");
    }
}
