//! Netcutter CLI
//!
//! Runs the netcutter build pipeline: a fixed, ordered list of jobs whose
//! outcomes are journaled so an interrupted run resumes where it stopped.

mod commands;
mod config;
mod jobs;
mod logging;

use clap::Parser;
use colored::*;
use commands::{Commands, exit_code, handle_command};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "netcutter")]
#[command(about = "Netcutter pipeline runner", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, env = "NETCUTTER_LOG", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    match handle_command(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::from(exit_code(&e))
        }
    }
}
