//! Core domain types
//!
//! This module contains the structures used across Netcutter crates.
//! Job definitions and configuration are built once at startup and shared
//! read-only; job records are the only values that move through the journal.

pub mod job;
pub mod pipeline;
