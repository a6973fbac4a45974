//! Scheduler layer for the runner
//!
//! Pure selection logic: reduces the registry to the ordered list of jobs that
//! still have to run, given the user's filters and the journal.

pub mod selection;

pub use selection::JobScheduler;
