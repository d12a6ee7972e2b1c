//! Dashboard command implementation

use anyhow::{Context, Result};

use wf_dashboard::{render, DashboardReader};

use crate::cli::{DashboardArgs, GlobalArgs, OutputFormat};
use crate::commands::common::{load_project, open_database};

/// Execute the dashboard command
pub async fn execute(args: &DashboardArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let db = open_database(&project, args.database.as_deref(), global.verbose)?;

    let snapshot = DashboardReader::new(db)
        .snapshot()
        .await
        .context("Failed to read dashboard tables")?;

    match args.output {
        OutputFormat::Table => {
            println!("HDHI Clinical Insights\n");
            print!("{}", render::snapshot(&snapshot));
        }
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&snapshot).context("Failed to serialize to JSON")?;
            println!("{}", json);
        }
    }
    Ok(())
}
