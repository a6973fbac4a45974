//! Error types for the Netcutter pipeline

use thiserror::Error;

use crate::domain::job::JobStatus;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors reported by job selection, job execution and the journal
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid user input, detected before any job runs
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The filters left nothing to execute
    #[error("No jobs to run")]
    EmptyPipeline,

    /// A job ended in the `error` state and the run was halted
    #[error("Job '{job}' failed: {detail}")]
    JobFailed {
        /// Name of the failing job
        job: String,
        /// Captured failure message
        detail: String,
    },

    /// The base job behavior was invoked without a concrete implementation
    #[error("Job '{job}' does not implement execute(); use a concrete job action")]
    NotImplemented {
        /// Name of the job whose action is missing
        job: String,
    },

    /// A job record was asked to leave a terminal state
    #[error("Invalid status transition for job '{job}': {from} -> {to}")]
    InvalidTransition {
        job: String,
        from: JobStatus,
        to: JobStatus,
    },

    /// Reading or writing the journal file failed
    #[error("Journal I/O error: {0}")]
    JournalIo(#[from] std::io::Error),

    /// A journal record could not be encoded
    #[error("Journal format error: {0}")]
    JournalFormat(#[from] serde_json::Error),
}

impl PipelineError {
    /// Create a configuration error for a range boundary that is not selectable
    pub fn job_not_found(boundary: &str, name: &str) -> Self {
        Self::Configuration(format!(
            "{} job '{}' is not among the selected jobs",
            boundary, name
        ))
    }

    /// Check if this error was caused by user input rather than a job or I/O
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this error halted a run because a job failed
    pub fn is_job_failure(&self) -> bool {
        matches!(self, Self::JobFailed { .. })
    }
}
