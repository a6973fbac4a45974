//! Job lifecycle
//!
//! A [`Job`] wraps one [`JobAction`] and drives a single attempt through the
//! `pending -> done | error` state machine:
//! - records the start time
//! - executes the action on its own task so failures and panics stay contained
//! - records the end time and the outcome
//! - appends the finished record to the journal
//!
//! A failed attempt is reported to the caller as [`PipelineError::JobFailed`].

use async_trait::async_trait;
use chrono::Utc;
use netcutter_core::domain::job::{JobDefinition, JobRecord, JobStatus};
use netcutter_core::domain::pipeline::PipelineConfig;
use netcutter_core::error::{PipelineError, Result};
use std::any::Any;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::repository::JournalStore;

/// Everything a job action can see while it runs
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Identifier of the pipeline invocation
    pub run_id: Uuid,
    /// Name of the job being executed
    pub job_name: String,
    /// Shared, immutable pipeline configuration
    pub config: Arc<PipelineConfig>,
}

/// The side effect of a job
///
/// Concrete jobs override [`JobAction::execute`]. The default implementation
/// is the abstract base behavior and always fails with
/// [`PipelineError::NotImplemented`].
#[async_trait]
pub trait JobAction: Send + Sync {
    /// Performs the job's work
    ///
    /// # Arguments
    /// * `ctx` - The run identifier, job name and pipeline configuration
    ///
    /// # Errors
    /// Any error marks the attempt as failed and halts the pipeline.
    async fn execute(&self, ctx: &JobContext) -> anyhow::Result<()> {
        Err(PipelineError::NotImplemented {
            job: ctx.job_name.clone(),
        }
        .into())
    }
}

/// Job action with no concrete behavior
#[derive(Debug, Clone, Copy, Default)]
pub struct UnimplementedJob;

impl JobAction for UnimplementedJob {}

/// One schedulable unit of work and the state of its current attempt
pub struct Job {
    definition: JobDefinition,
    action: Arc<dyn JobAction>,
    context: JobContext,
    record: Option<JobRecord>,
}

impl Job {
    /// Creates a job that has not been attempted yet
    pub fn new(
        run_id: Uuid,
        definition: JobDefinition,
        action: Arc<dyn JobAction>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        let context = JobContext {
            run_id,
            job_name: definition.name().to_string(),
            config,
        };

        Self {
            definition,
            action,
            context,
            record: None,
        }
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn definition(&self) -> &JobDefinition {
        &self.definition
    }

    /// Current status; `pending` until an attempt has finished
    pub fn status(&self) -> JobStatus {
        self.record
            .as_ref()
            .map(JobRecord::status)
            .unwrap_or(JobStatus::Pending)
    }

    /// Elapsed time of the attempt, `None` until it is terminal
    pub fn elapsed_time(&self) -> Option<chrono::Duration> {
        self.record.as_ref().and_then(JobRecord::elapsed_time)
    }

    /// Record of the finished attempt, if the job has run
    pub fn record(&self) -> Option<&JobRecord> {
        self.record.as_ref()
    }

    /// Invokes the job's action directly, without lifecycle bookkeeping
    pub async fn execute(&self) -> anyhow::Result<()> {
        self.action.execute(&self.context).await
    }

    /// Runs one attempt of the job and journals its outcome
    ///
    /// # Returns
    /// The finished record when the job succeeded
    ///
    /// # Errors
    /// - [`PipelineError::JobFailed`] if the action failed; the record is journaled first
    /// - [`PipelineError::InvalidTransition`] if the job already ran
    /// - a journal error if the record could not be persisted
    pub async fn run(&mut self, journal: &dyn JournalStore) -> Result<&JobRecord> {
        if let Some(previous) = &self.record {
            return Err(PipelineError::InvalidTransition {
                job: self.context.job_name.clone(),
                from: previous.status(),
                to: JobStatus::Pending,
            });
        }

        let mut record = JobRecord::begin(self.context.run_id, self.name(), Utc::now());
        info!("Starting job {}", self.name());

        match self.execute_isolated().await {
            Ok(()) => record.mark_done(Utc::now())?,
            Err(detail) => record.mark_error(detail, Utc::now())?,
        }

        journal.append(&record)?;
        let record = self.record.insert(record);

        match record.status() {
            JobStatus::Error => {
                let detail = record.error().unwrap_or_default().to_string();
                error!("Job {} failed: {}", record.job_name(), detail);
                Err(PipelineError::JobFailed {
                    job: record.job_name().to_string(),
                    detail,
                })
            }
            _ => {
                info!(
                    "Job {} done in {}",
                    record.job_name(),
                    format_elapsed(record.elapsed_time())
                );
                Ok(record)
            }
        }
    }

    /// Executes the action on a dedicated task and flattens every failure into
    /// a message, including panics
    async fn execute_isolated(&self) -> std::result::Result<(), String> {
        let action = Arc::clone(&self.action);
        let context = self.context.clone();

        let handle = tokio::spawn(async move { action.execute(&context).await });

        match handle.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(format!("{:#}", e)),
            Err(e) if e.is_panic() => Err(format!("job panicked: {}", panic_message(e.into_panic()))),
            Err(e) => Err(format!("job task failed: {}", e)),
        }
    }
}

/// Formats an elapsed time, `-` when not available
pub fn format_elapsed(elapsed: Option<chrono::Duration>) -> String {
    match elapsed {
        Some(d) => {
            let millis = d.num_milliseconds();
            let sign = if millis < 0 { "-" } else { "" };
            let millis = millis.unsigned_abs();
            format!("{}{}.{:03}s", sign, millis / 1000, millis % 1000)
        }
        None => "-".to_string(),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
