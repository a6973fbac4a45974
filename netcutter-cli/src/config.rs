//! Configuration module
//!
//! Builds the pipeline configuration from a `key=value` configuration file
//! and command-line overrides, then validates it before any job runs.
//!
//! Recognised keys: `logfile`, `output`, `project_name`, `tags`, `start_at`,
//! `stop_at`. Every other key must be one of [`VALID_OPTIONS`] and is passed
//! to the jobs as an option; `*_file` options must name readable files.

use clap::Args;
use netcutter_core::domain::pipeline::PipelineConfig;
use netcutter_core::error::{PipelineError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Job options a configuration may set besides the recognised keys
pub const VALID_OPTIONS: [&str; 16] = [
    "bin",
    "neo4j_memory",
    "neo4j_address",
    "biogrid_file",
    "string_file",
    "ppaxe_file",
    "drivers_file",
    "alias_file",
    "web_address",
    "content_templates",
    "logo_img",
    "download_databases",
    "drivers_ext",
    "nvariants_file",
    "gene_ontology_file",
    "download_gene_ontology",
];

/// `(kept, dropped)`: when both are set the second one is ignored
const INCOMPATIBLE_OPTIONS: [(&str, &str); 4] = [
    ("biogrid_file", "download_databases"),
    ("string_file", "download_databases"),
    ("ppaxe_file", "download_databases"),
    ("gene_ontology_file", "download_gene_ontology"),
];

/// Pipeline selection and configuration flags shared by several commands
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Netcutter configuration file (key=value lines)
    #[arg(short, long, env = "NETCUTTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Only run jobs carrying one of these tags (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// First job to run
    #[arg(long)]
    pub start_at: Option<String>,

    /// Last job to run
    #[arg(long)]
    pub stop_at: Option<String>,

    /// Journal file (overrides `logfile` from the config file)
    #[arg(short, long)]
    pub journal: Option<PathBuf>,

    /// Output directory (overrides `output` from the config file)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Extra job option as key=value (repeatable)
    #[arg(long = "set", value_parser = parse_key_val)]
    pub options: Vec<(String, String)>,
}

impl SelectionArgs {
    /// Resolves the effective pipeline configuration
    ///
    /// Values from the command line win over the configuration file.
    pub fn resolve(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => ConfigFile::load(path)?.into_pipeline_config(),
            None => PipelineConfig::default(),
        };

        if !self.tags.is_empty() {
            config.tag_filter = Some(normalize_tags(self.tags.iter().map(String::as_str)));
        }
        if let Some(start) = &self.start_at {
            config.start_at = Some(start.clone());
        }
        if let Some(stop) = &self.stop_at {
            config.stop_at = Some(stop.clone());
        }
        if let Some(journal) = &self.journal {
            config.journal_path = journal.clone();
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        for (key, value) in &self.options {
            config.options.insert(key.clone(), value.clone());
        }

        drop_incompatible_options(&mut config);
        validate(&config)?;
        debug!("Resolved configuration: {:?}", config);
        Ok(config)
    }
}

/// Journal location flags of the `history` command
#[derive(Args, Debug, Clone, Default)]
pub struct JournalArgs {
    /// Netcutter configuration file, read for its `logfile`
    #[arg(short, long, env = "NETCUTTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Journal file (overrides `logfile` from the config file)
    #[arg(short, long)]
    pub journal: Option<PathBuf>,
}

impl JournalArgs {
    /// Resolves the journal path: flag, then config file, then the default
    pub fn journal_path(&self) -> Result<PathBuf> {
        if let Some(journal) = &self.journal {
            return Ok(journal.clone());
        }
        match &self.config {
            Some(path) => Ok(ConfigFile::load(path)?.into_pipeline_config().journal_path),
            None => Ok(PipelineConfig::default().journal_path),
        }
    }
}

/// Parsed `key=value` configuration file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    entries: BTreeMap<String, String>,
}

impl ConfigFile {
    /// Reads and parses the configuration file at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Configuration(format!(
                "cannot read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self::parse(&contents))
    }

    /// Parses configuration text
    ///
    /// Blank lines and `#` comments are ignored. Lines without `=` are skipped
    /// with a warning; for repeated keys the first value is kept.
    pub fn parse(contents: &str) -> Self {
        let mut entries = BTreeMap::new();

        for (idx, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                warn!("Invalid config parameter on line {}: {}", idx + 1, line);
                continue;
            };

            let key = key.trim();
            if key.is_empty() {
                warn!("Missing option name on line {}: {}", idx + 1, line);
                continue;
            }
            if entries.contains_key(key) {
                warn!("Repeated option '{}' on line {}, ignoring it", key, idx + 1);
                continue;
            }
            entries.insert(key.to_string(), value.trim().to_string());
        }

        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Maps the recognised keys to typed fields and keeps the rest as job options
    pub fn into_pipeline_config(self) -> PipelineConfig {
        let mut config = PipelineConfig::default();

        for (key, value) in self.entries {
            match key.as_str() {
                "logfile" => config.journal_path = PathBuf::from(value),
                "output" => config.output_dir = PathBuf::from(value),
                "project_name" => config.project_name = Some(value),
                "tags" => config.tag_filter = Some(normalize_tags(value.split(','))),
                "start_at" => config.start_at = Some(value),
                "stop_at" => config.stop_at = Some(value),
                _ => {
                    config.options.insert(key, value);
                }
            }
        }

        config
    }
}

/// Checks the configuration for values no run could use
pub fn validate(config: &PipelineConfig) -> Result<()> {
    if config.journal_path.as_os_str().is_empty() {
        return Err(PipelineError::Configuration(
            "journal path cannot be empty".to_string(),
        ));
    }

    if let Some(tags) = &config.tag_filter {
        if tags.is_empty() {
            return Err(PipelineError::Configuration(
                "tags is set but lists no tag".to_string(),
            ));
        }
    }

    for (option, value) in [("start_at", &config.start_at), ("stop_at", &config.stop_at)] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(PipelineError::Configuration(format!(
                "{} cannot be empty",
                option
            )));
        }
    }

    if let Some(key) = config.options.keys().find(|k| !VALID_OPTIONS.contains(&k.as_str())) {
        return Err(PipelineError::Configuration(format!(
            "'{}' is not a valid option",
            key
        )));
    }

    for (key, file) in config.options.iter().filter(|(k, _)| k.ends_with("_file")) {
        check_readable_file(key, Path::new(file))?;
    }

    Ok(())
}

/// Removes the second option of every incompatible pair that is fully set
pub fn drop_incompatible_options(config: &mut PipelineConfig) {
    for (kept, dropped) in INCOMPATIBLE_OPTIONS {
        if config.options.contains_key(kept) && config.options.remove(dropped).is_some() {
            warn!(
                "Incompatible options '{}' and '{}' provided, using '{}'",
                kept, dropped, kept
            );
        }
    }
}

fn check_readable_file(key: &str, path: &Path) -> Result<()> {
    let readable = std::fs::metadata(path).is_ok_and(|m| m.is_file())
        && std::fs::File::open(path).is_ok();
    if !readable {
        return Err(PipelineError::Configuration(format!(
            "{} '{}' is not a readable file",
            key,
            path.display()
        )));
    }
    Ok(())
}

/// Parse a single key=value pair
fn parse_key_val(s: &str) -> anyhow::Result<(String, String)> {
    let pos = s
        .find('=')
        .ok_or_else(|| anyhow::anyhow!("invalid KEY=value: no `=` found in `{}`", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn normalize_tags<'a>(tags: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    tags.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
