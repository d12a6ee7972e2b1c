//! wardflow CLI - run, schedule and inspect the HDHI admissions pipeline

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod logging;

use cli::Cli;
use commands::common::ExitCode;
use commands::{dashboard, run, schedule, status};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    logging::init(cli.global.log_level.as_deref(), cli.global.verbose);

    match dispatch(&cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<ExitCode>() {
            Some(code) => std::process::ExitCode::from(code.0 as u8),
            None => {
                eprintln!("Error: {:#}", err);
                std::process::ExitCode::FAILURE
            }
        },
    }
}

async fn dispatch(cli: &Cli) -> Result<()> {
    match &cli.command {
        cli::Commands::Run(args) => run::execute(args, &cli.global).await,
        cli::Commands::Schedule(args) => schedule::execute(args, &cli.global).await,
        cli::Commands::Status(args) => status::execute(args, &cli.global).await,
        cli::Commands::Dashboard(args) => dashboard::execute(args, &cli.global).await,
    }
}
