//! Netcutter Runner
//!
//! Executes a fixed, ordered pipeline of named jobs and journals every attempt
//! so an interrupted run can be resumed.
//!
//! Architecture:
//! - Job: lifecycle of one attempt around an injected [`JobAction`]
//! - Registry: the ordered catalogue of jobs with their tags and factories
//! - Repository: the append-only journal of job records
//! - Scheduler: reduction of the registry to the jobs still to run
//! - Services: the sequential pipeline runner and the external command action

pub mod job;
pub mod registry;
pub mod repository;
pub mod scheduler;
pub mod service;

pub use job::{Job, JobAction, JobContext, UnimplementedJob};
pub use registry::{JobRegistry, RegisteredJob};
pub use repository::{FileJournal, InMemoryJournal, JournalStore};
pub use scheduler::JobScheduler;
pub use service::{ExternalCommand, PipelineRunner, RunSummary};
