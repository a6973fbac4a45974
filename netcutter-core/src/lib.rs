//! Netcutter Core
//!
//! Core types shared by the Netcutter pipeline runner and its CLI.
//!
//! This crate contains:
//! - Domain types: job definitions, job attempt records and pipeline configuration
//! - Error kinds: the failures the scheduler and runner report to callers

pub mod domain;
pub mod error;

pub use error::{PipelineError, Result};
