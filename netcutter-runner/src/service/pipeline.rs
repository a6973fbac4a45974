//! Pipeline runner
//!
//! Drives one pipeline run:
//! - computes the jobs to run once, up front
//! - executes them strictly in order, one at a time
//! - stops at the first failed job
//!
//! Each job's record is journaled by the job itself before the next one starts.

use netcutter_core::domain::job::{JobDefinition, JobRecord};
use netcutter_core::domain::pipeline::PipelineConfig;
use netcutter_core::error::{PipelineError, Result};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::job::Job;
use crate::registry::JobRegistry;
use crate::repository::JournalStore;
use crate::scheduler::JobScheduler;

/// Outcome of a pipeline run that completed every selected job
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    /// Records of the executed jobs, in execution order
    pub records: Vec<JobRecord>,
}

impl RunSummary {
    /// Names of the executed jobs, in execution order
    pub fn job_names(&self) -> Vec<&str> {
        self.records.iter().map(JobRecord::job_name).collect()
    }
}

/// Sequential pipeline driver
pub struct PipelineRunner {
    registry: JobRegistry,
    config: Arc<PipelineConfig>,
    journal: Arc<dyn JournalStore>,
}

impl PipelineRunner {
    /// Creates a runner for `registry`
    ///
    /// # Arguments
    /// * `registry` - All jobs of the pipeline, in execution order
    /// * `config` - Filters and job settings shared by every job
    /// * `journal` - Where job attempts are read from and appended to
    pub fn new(
        registry: JobRegistry,
        config: PipelineConfig,
        journal: Arc<dyn JournalStore>,
    ) -> Self {
        Self {
            registry,
            config: Arc::new(config),
            journal,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Lists the jobs a run would execute, without executing them
    pub fn plan(&self) -> Result<Vec<&JobDefinition>> {
        let jobs = JobScheduler::new(&self.registry)
            .jobs_to_run(&self.config, self.journal.as_ref())?;
        Ok(jobs.into_iter().map(|job| job.definition()).collect())
    }

    /// Runs every pending job in order
    ///
    /// # Returns
    /// The records of all executed jobs when every one of them succeeded
    ///
    /// # Errors
    /// - [`PipelineError::Configuration`] or [`PipelineError::EmptyPipeline`] before any job runs
    /// - [`PipelineError::JobFailed`] naming the job that halted the run
    /// - a journal error if a record could not be persisted
    pub async fn run(&self) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        info!("Computing jobs to run (run {})", run_id);

        let jobs = match JobScheduler::new(&self.registry)
            .jobs_to_run(&self.config, self.journal.as_ref())
        {
            Ok(jobs) => jobs,
            Err(PipelineError::EmptyPipeline) => {
                warn!("No jobs to run");
                return Err(PipelineError::EmptyPipeline);
            }
            Err(e) => return Err(e),
        };

        let total = jobs.len();
        info!(
            "Running {} job(s): {}",
            total,
            jobs.iter().map(|j| j.name()).collect::<Vec<_>>().join(", ")
        );

        let mut records = Vec::with_capacity(total);
        for (idx, registered) in jobs.into_iter().enumerate() {
            info!("Job {}/{}: {}", idx + 1, total, registered.name());

            let action = registered.instantiate(&self.config);
            let mut job = Job::new(
                run_id,
                registered.definition().clone(),
                action,
                Arc::clone(&self.config),
            );

            match job.run(self.journal.as_ref()).await {
                Ok(record) => records.push(record.clone()),
                Err(e) => {
                    error!(
                        "Pipeline halted at job {}/{} ({}): {}",
                        idx + 1,
                        total,
                        registered.name(),
                        e
                    );
                    return Err(e);
                }
            }
        }

        info!("Pipeline completed: {} job(s) done", records.len());
        Ok(RunSummary { run_id, records })
    }
}
