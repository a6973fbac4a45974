//! Pipeline configuration

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

/// Default journal location, relative to the working directory
pub const DEFAULT_JOURNAL_PATH: &str = "netcutter.log";

/// Pipeline configuration options
///
/// Built once before a run and shared read-only with the scheduler and every
/// job. Parsing is done by the caller; this type only holds typed values.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Optional project label, used only for reporting
    pub project_name: Option<String>,

    /// Only jobs sharing at least one tag with this set are eligible
    pub tag_filter: Option<BTreeSet<String>>,

    /// First job of the inclusive range to run
    pub start_at: Option<String>,

    /// Last job of the inclusive range to run
    pub stop_at: Option<String>,

    /// Append-only journal of job attempts
    pub journal_path: PathBuf,

    /// Root directory jobs write their results into
    pub output_dir: PathBuf,

    /// Job-specific settings (input files, tool locations, ...)
    pub options: BTreeMap<String, String>,
}

impl PipelineConfig {
    /// Creates a configuration journaling to `journal_path`
    pub fn new(journal_path: impl Into<PathBuf>) -> Self {
        Self {
            journal_path: journal_path.into(),
            ..Self::default()
        }
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tag_filter = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_start_at(mut self, name: impl Into<String>) -> Self {
        self.start_at = Some(name.into());
        self
    }

    pub fn with_stop_at(mut self, name: impl Into<String>) -> Self {
        self.stop_at = Some(name.into());
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Adds a job-specific option
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Looks up a job-specific option
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Looks up a job-specific option that must be set
    pub fn require_option(&self, key: &str) -> Result<&str> {
        self.option(key).ok_or_else(|| {
            PipelineError::Configuration(format!("required option '{}' is not set", key))
        })
    }

    /// Resolves `relative` against the output directory
    pub fn output_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.output_dir.join(relative)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            project_name: None,
            tag_filter: None,
            start_at: None,
            stop_at: None,
            journal_path: PathBuf::from(DEFAULT_JOURNAL_PATH),
            output_dir: PathBuf::from("./"),
            options: BTreeMap::new(),
        }
    }
}
