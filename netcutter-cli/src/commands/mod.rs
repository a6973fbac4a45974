//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod history;
mod jobs;
mod run;

use anyhow::Result;
use clap::Subcommand;
use netcutter_core::PipelineError;

use crate::config::{JournalArgs, SelectionArgs};

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the pending jobs of the pipeline
    Run(SelectionArgs),
    /// Show the jobs a run would execute, without running them
    Plan(SelectionArgs),
    /// List every registered job with its tags
    Jobs,
    /// Show the records stored in the journal
    History {
        #[command(flatten)]
        journal: JournalArgs,

        /// Only show the most recent record of each job
        #[arg(long)]
        latest: bool,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Run(selection) => run::run_pipeline(&selection).await,
        Commands::Plan(selection) => run::plan_pipeline(&selection),
        Commands::Jobs => jobs::list_jobs(),
        Commands::History { journal, latest } => history::show_history(&journal, latest),
    }
}

/// Maps a failed command to the process exit code
///
/// `1` a job failed, `2` no job selected, `3` invalid configuration,
/// `4` anything else.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<PipelineError>() {
        Some(e) if e.is_job_failure() => 1,
        Some(PipelineError::EmptyPipeline) => 2,
        Some(e) if e.is_configuration() => 3,
        _ => 4,
    }
}
