//! CLI argument definitions using clap derive API

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// wardflow - extract, load and transform the HDHI admissions dataset
#[derive(Parser, Debug)]
#[command(name = "wf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log filter, e.g. `info` or `wf_pipeline=debug` (overrides RUST_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline once
    Run(RunArgs),

    /// Run the pipeline on its schedule until interrupted
    Schedule(ScheduleArgs),

    /// Show recent runs
    Status(StatusArgs),

    /// Print the dashboard aggregates
    Dashboard(DashboardArgs),
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Logical date of the run (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub logical_date: Option<NaiveDate>,

    /// Override the dataset path
    #[arg(long)]
    pub dataset: Option<String>,

    /// Override the database path
    #[arg(long)]
    pub database: Option<String>,

    /// Retry failed steps immediately instead of waiting
    #[arg(long)]
    pub no_retry_delay: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Arguments for the schedule command
#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// Run at most the latest due interval, then exit
    #[arg(long)]
    pub once: bool,

    /// Override the dataset path
    #[arg(long)]
    pub dataset: Option<String>,

    /// Override the database path
    #[arg(long)]
    pub database: Option<String>,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Number of runs to show
    #[arg(short = 'n', long, default_value = "10")]
    pub limit: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Arguments for the dashboard command
#[derive(Args, Debug)]
pub struct DashboardArgs {
    /// Override the database path
    #[arg(long)]
    pub database: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
