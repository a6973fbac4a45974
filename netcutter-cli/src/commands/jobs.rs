//! Jobs command handler

use anyhow::Result;
use colored::*;

use crate::jobs::default_registry;

/// List the registered jobs in execution order
pub fn list_jobs() -> Result<()> {
    let registry = default_registry()?;

    if registry.is_empty() {
        println!("{}", "No jobs registered.".yellow());
        return Ok(());
    }

    println!("{}", format!("{} registered job(s):", registry.len()).bold());
    println!();
    for (idx, job) in registry.jobs().iter().enumerate() {
        let tags: Vec<&str> = job.definition().tags().iter().map(String::as_str).collect();
        println!("  {:>2}. {:<20} {}", idx + 1, job.name().cyan(), tags.join(", "));
    }

    Ok(())
}
