//! Repository layer
//!
//! Persistence for job attempts. The journal is the only state that survives
//! a process restart, so every resume decision is derived from it.

mod journal;

pub use journal::{FileJournal, InMemoryJournal, JournalStore, latest_statuses};
