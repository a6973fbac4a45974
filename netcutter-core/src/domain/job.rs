//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::error::{PipelineError, Result};

/// Registry entry describing one schedulable job
///
/// The name is the resume key, so it must stay stable across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDefinition {
    name: String,
    tags: BTreeSet<String>,
}

impl JobDefinition {
    /// Creates a job definition with the given name and tags
    pub fn new<I, T>(name: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            name: name.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Returns `true` if at least one of the job's tags is in `filter`
    pub fn matches_any_tag(&self, filter: &BTreeSet<String>) -> bool {
        !self.tags.is_disjoint(filter)
    }
}

/// Job execution status
///
/// The lowercase spelling is part of the journal format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Done,
    Error,
}

impl JobStatus {
    /// Check if the status can no longer change
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Done => write!(f, "done"),
            JobStatus::Error => write!(f, "error"),
        }
    }
}

/// One execution attempt of one job
///
/// Created `pending` when the attempt starts and moved exactly once to a
/// terminal status. Field order is the journal line layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    run_id: Uuid,
    job_name: String,
    status: JobStatus,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    error: Option<String>,
}

impl JobRecord {
    /// Opens a pending attempt for `job_name` started at `start_time`
    pub fn begin(run_id: Uuid, job_name: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            run_id,
            job_name: job_name.into(),
            status: JobStatus::Pending,
            start_time,
            end_time: None,
            error: None,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// Failure message, present only when the status is `error`
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Time between start and end, or `None` while the attempt is pending
    pub fn elapsed_time(&self) -> Option<chrono::Duration> {
        if !self.status.is_terminal() {
            return None;
        }
        self.end_time.map(|end| end - self.start_time)
    }

    /// Marks the attempt as successfully completed
    pub fn mark_done(&mut self, end_time: DateTime<Utc>) -> Result<()> {
        self.finish(JobStatus::Done, None, end_time)
    }

    /// Marks the attempt as failed with the captured message
    pub fn mark_error(&mut self, detail: impl Into<String>, end_time: DateTime<Utc>) -> Result<()> {
        self.finish(JobStatus::Error, Some(detail.into()), end_time)
    }

    fn finish(
        &mut self,
        status: JobStatus,
        error: Option<String>,
        end_time: DateTime<Utc>,
    ) -> Result<()> {
        if self.status.is_terminal() {
            return Err(PipelineError::InvalidTransition {
                job: self.job_name.clone(),
                from: self.status,
                to: status,
            });
        }

        self.status = status;
        self.error = error;
        self.end_time = Some(end_time);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_definition_tag_intersection() {
        let job = JobDefinition::new("BuildGraph", ["build", "graph"]);
        let build: BTreeSet<String> = ["build".to_string()].into();
        let neo4j: BTreeSet<String> = ["neo4j".to_string()].into();

        assert!(job.matches_any_tag(&build));
        assert!(!job.matches_any_tag(&neo4j));
        assert!(!job.matches_any_tag(&BTreeSet::new()));
        assert!(!JobDefinition::new("Untagged", Vec::<String>::new()).matches_any_tag(&build));
    }

    #[test]
    fn test_pending_record_has_no_elapsed_time() {
        let record = JobRecord::begin(Uuid::new_v4(), "A", at(0));
        assert_eq!(record.status(), JobStatus::Pending);
        assert_eq!(record.elapsed_time(), None);
        assert_eq!(record.end_time(), None);
        assert_eq!(record.error(), None);
    }

    #[test]
    fn test_mark_done() {
        let mut record = JobRecord::begin(Uuid::new_v4(), "A", at(0));
        record.mark_done(at(90)).unwrap();

        assert_eq!(record.status(), JobStatus::Done);
        assert_eq!(record.elapsed_time(), Some(chrono::Duration::seconds(90)));
        assert_eq!(record.error(), None);
    }

    #[test]
    fn test_mark_error_keeps_detail() {
        let mut record = JobRecord::begin(Uuid::new_v4(), "A", at(0));
        record.mark_error("tool exited with status 1", at(5)).unwrap();

        assert_eq!(record.status(), JobStatus::Error);
        assert_eq!(record.error(), Some("tool exited with status 1"));
        assert_eq!(record.elapsed_time(), Some(chrono::Duration::seconds(5)));
    }

    #[test]
    fn test_terminal_state_is_never_revisited() {
        let mut record = JobRecord::begin(Uuid::new_v4(), "A", at(0));
        record.mark_done(at(1)).unwrap();

        let err = record.mark_error("late failure", at(2)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidTransition {
                from: JobStatus::Done,
                to: JobStatus::Error,
                ..
            }
        ));
        assert_eq!(record.status(), JobStatus::Done);
        assert_eq!(record.end_time(), Some(at(1)));
    }

    #[test]
    fn test_record_serialization_layout() {
        let run_id = Uuid::nil();
        let mut record = JobRecord::begin(run_id, "CreateDirectories", at(0));
        record.mark_done(at(3)).unwrap();

        let line = serde_json::to_string(&record).unwrap();
        assert_eq!(
            line,
            "{\"run_id\":\"00000000-0000-0000-0000-000000000000\",\
             \"job_name\":\"CreateDirectories\",\"status\":\"done\",\
             \"start_time\":\"2023-11-14T22:13:20Z\",\
             \"end_time\":\"2023-11-14T22:13:23Z\",\"error\":null}"
        );

        let parsed: JobRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, record);
    }
}
