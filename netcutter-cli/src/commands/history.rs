//! History command handler
//!
//! Prints the journal of job attempts, oldest first.

use anyhow::Result;
use colored::*;
use netcutter_core::domain::job::{JobRecord, JobStatus};
use netcutter_runner::job::format_elapsed;
use netcutter_runner::{FileJournal, JournalStore};
use std::collections::HashSet;

use crate::config::JournalArgs;

/// Show the records of the configured journal
pub fn show_history(args: &JournalArgs, latest: bool) -> Result<()> {
    let journal = FileJournal::new(args.journal_path()?);
    let mut records = journal.read_records()?;

    if latest {
        records = latest_records(records);
    }

    if records.is_empty() {
        println!(
            "{}",
            format!("No records in {}.", journal.path().display()).yellow()
        );
        return Ok(());
    }

    println!(
        "{}",
        format!("{} record(s) in {}:", records.len(), journal.path().display()).bold()
    );
    println!();
    for record in &records {
        print_record(record);
    }

    Ok(())
}

/// Keeps the most recent record of each job, in journal order
fn latest_records(records: Vec<JobRecord>) -> Vec<JobRecord> {
    let mut seen = HashSet::new();
    let mut latest: Vec<JobRecord> = records
        .into_iter()
        .rev()
        .filter(|r| seen.insert(r.job_name().to_string()))
        .collect();
    latest.reverse();
    latest
}

/// Print a one-line summary of a job record
pub(crate) fn print_record(record: &JobRecord) {
    let run = record.run_id().to_string();
    println!(
        "  {} {} {:<20} {:<7} {:>10}",
        record
            .start_time()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed(),
        run[..8].dimmed(),
        record.job_name().cyan(),
        colorize_status(record.status()),
        format_elapsed(record.elapsed_time())
    );
    if let Some(error) = record.error() {
        println!("      {}", error.red());
    }
}

/// Colorize job status for display
fn colorize_status(status: JobStatus) -> ColoredString {
    let status_str = status.to_string();
    match status {
        JobStatus::Pending => status_str.yellow(),
        JobStatus::Done => status_str.green(),
        JobStatus::Error => status_str.red(),
    }
}
