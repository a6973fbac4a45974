//! Job selection
//!
//! Reduction steps, always applied in this order:
//! 1. tag filter
//! 2. start-at slice
//! 3. stop-at slice
//! 4. resume filter (drops jobs whose last journaled attempt is `done`)
//!
//! Every step only removes jobs, so registry order is preserved. Range
//! boundaries are looked up in the tag-filtered list, never in the full
//! registry.

use netcutter_core::domain::pipeline::PipelineConfig;
use netcutter_core::error::{PipelineError, Result};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

use crate::registry::{JobRegistry, RegisteredJob};
use crate::repository::JournalStore;

/// Computes the jobs still to run for a pipeline
pub struct JobScheduler<'a> {
    registry: &'a JobRegistry,
}

impl<'a> JobScheduler<'a> {
    /// Creates a scheduler over `registry`
    pub fn new(registry: &'a JobRegistry) -> Self {
        Self { registry }
    }

    /// Selects the ordered list of jobs to run
    ///
    /// # Arguments
    /// * `config` - Tag filter and range boundaries
    /// * `journal` - History used to skip jobs that are already done
    ///
    /// # Errors
    /// - [`PipelineError::Configuration`] if a range boundary is not among the tag-filtered jobs
    /// - [`PipelineError::EmptyPipeline`] if nothing is left to run
    pub fn jobs_to_run(
        &self,
        config: &PipelineConfig,
        journal: &dyn JournalStore,
    ) -> Result<Vec<&'a RegisteredJob>> {
        let in_range = self.jobs_in_range(config)?;

        let done = journal.done_job_names()?;
        let pending = remove_done_jobs(in_range, &done);
        debug!("{} job(s) pending after resume filter", pending.len());

        if pending.is_empty() {
            return Err(PipelineError::EmptyPipeline);
        }
        Ok(pending)
    }

    /// Applies the tag filter and the range slices, without consulting the journal
    pub fn jobs_in_range(&self, config: &PipelineConfig) -> Result<Vec<&'a RegisteredJob>> {
        let all: Vec<&'a RegisteredJob> = self.registry.jobs().iter().collect();

        let tagged = match &config.tag_filter {
            Some(tags) => keep_jobs_with_tags(all, tags),
            None => all,
        };
        debug!("{} job(s) selected by tags", tagged.len());

        let mut jobs = tagged.clone();

        if let Some(start) = &config.start_at {
            jobs = remove_jobs_before(jobs, start)?;
            debug!("{} job(s) from start_at '{}'", jobs.len(), start);
        }

        if let Some(stop) = &config.stop_at {
            if position(&tagged, stop).is_none() {
                return Err(PipelineError::job_not_found("stop_at", stop));
            }
            // Present in the tagged list but cut by start_at: the range is empty
            jobs = if position(&jobs, stop).is_some() {
                remove_jobs_after(jobs, stop)?
            } else {
                Vec::new()
            };
            debug!("{} job(s) up to stop_at '{}'", jobs.len(), stop);
        }

        Ok(jobs)
    }
}

/// Keeps the jobs sharing at least one tag with `tags`
pub fn keep_jobs_with_tags<'a>(
    jobs: Vec<&'a RegisteredJob>,
    tags: &BTreeSet<String>,
) -> Vec<&'a RegisteredJob> {
    jobs.into_iter()
        .filter(|job| job.definition().matches_any_tag(tags))
        .collect()
}

/// Keeps the named job and every job after it
pub fn remove_jobs_before<'a>(
    mut jobs: Vec<&'a RegisteredJob>,
    name: &str,
) -> Result<Vec<&'a RegisteredJob>> {
    let idx = position(&jobs, name).ok_or_else(|| PipelineError::job_not_found("start_at", name))?;
    Ok(jobs.split_off(idx))
}

/// Keeps the named job and every job before it
pub fn remove_jobs_after<'a>(
    mut jobs: Vec<&'a RegisteredJob>,
    name: &str,
) -> Result<Vec<&'a RegisteredJob>> {
    let idx = position(&jobs, name).ok_or_else(|| PipelineError::job_not_found("stop_at", name))?;
    jobs.truncate(idx + 1);
    Ok(jobs)
}

/// Drops the jobs whose names are in `done`
pub fn remove_done_jobs<'a>(
    jobs: Vec<&'a RegisteredJob>,
    done: &HashSet<String>,
) -> Vec<&'a RegisteredJob> {
    jobs.into_iter()
        .filter(|job| !done.contains(job.name()))
        .collect()
}

fn position(jobs: &[&RegisteredJob], name: &str) -> Option<usize> {
    jobs.iter().position(|job| job.name() == name)
}
