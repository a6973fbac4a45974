//! Run and plan command handlers

use anyhow::Result;
use colored::*;
use netcutter_runner::{FileJournal, PipelineRunner};
use std::sync::Arc;

use super::history::print_record;
use crate::config::SelectionArgs;
use crate::jobs::default_registry;

/// Build the runner for the resolved configuration
fn build_runner(selection: &SelectionArgs) -> Result<PipelineRunner> {
    let config = selection.resolve()?;
    let journal = Arc::new(FileJournal::new(&config.journal_path));
    Ok(PipelineRunner::new(default_registry()?, config, journal))
}

/// Run every pending job and print the records of this run
pub async fn run_pipeline(selection: &SelectionArgs) -> Result<()> {
    let runner = build_runner(selection)?;
    if let Some(project) = &runner.config().project_name {
        println!("{} {}", "Project:".bold(), project);
    }

    let summary = runner.run().await?;

    println!(
        "{}",
        format!(
            "✓ Pipeline completed: {} job(s) done (run {})",
            summary.records.len(),
            summary.run_id
        )
        .green()
        .bold()
    );
    println!();
    for record in &summary.records {
        print_record(record);
    }

    Ok(())
}

/// Print the jobs a run would execute
pub fn plan_pipeline(selection: &SelectionArgs) -> Result<()> {
    let runner = build_runner(selection)?;
    let plan = runner.plan()?;

    println!("{}", format!("{} job(s) to run:", plan.len()).bold());
    println!();
    for (idx, job) in plan.iter().enumerate() {
        let tags: Vec<&str> = job.tags().iter().map(String::as_str).collect();
        println!(
            "  {:>2}. {}  {}",
            idx + 1,
            job.name().cyan(),
            format!("[{}]", tags.join(", ")).dimmed()
        );
    }

    Ok(())
}
