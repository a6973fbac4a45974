//! Netcutter jobs
//!
//! The concrete jobs of the pipeline and the registry that orders them:
//! `build` jobs lay out the output and build the graph, `neo4j` jobs export it
//! for the graph database.

use anyhow::{Context, Result};
use async_trait::async_trait;
use netcutter_core::domain::pipeline::PipelineConfig;
use netcutter_runner::{ExternalCommand, JobAction, JobContext, JobRegistry};
use tracing::{debug, info};

/// Output sub-directories created by [`CreateDirectories`], parents first
pub const DIRECTORIES: [&str; 12] = [
    "plots",
    "graphs",
    "tables",
    "django-project",
    "logs",
    "databases",
    "GO",
    "neo4j",
    "neo4j/import",
    "neo4j/data",
    "neo4j/logs",
    "neo4j/conf",
];

/// Graph sources accepted by the graph builder, as `(option, source name)`
const GRAPH_SOURCES: [(&str, &str); 3] = [
    ("biogrid_file", "biogrid"),
    ("string_file", "string"),
    ("ppaxe_file", "ppaxe"),
];

const GRAPH_BUILDER: &str = "filter_interactions_to_graph.pl";
const EDGE_EXPORTER: &str = "edge2neo4jcsv.pl";
const NODE_EXPORTER: &str = "node2neo4jcsv.pl";

/// Deepest graph level exported to neo4j
const MAX_GRAPH_LEVEL: &str = "4";

/// Creates the output directory layout
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateDirectories;

#[async_trait]
impl JobAction for CreateDirectories {
    async fn execute(&self, ctx: &JobContext) -> Result<()> {
        for directory in DIRECTORIES {
            let path = ctx.config.output_path(directory);
            debug!("Creating directory {}", path.display());
            tokio::fs::create_dir_all(&path)
                .await
                .with_context(|| format!("Failed to create directory {}", path.display()))?;
        }
        info!(
            "Created {} directories under {}",
            DIRECTORIES.len(),
            ctx.config.output_dir.display()
        );
        Ok(())
    }
}

/// Builds the interaction graph files with the external graph builder
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildGraph;

impl BuildGraph {
    /// Assembles the graph builder invocation from the configuration
    ///
    /// # Errors
    /// Fails if `bin`, `drivers_file` or `alias_file` is missing, if no graph
    /// source file is set, or if `drivers_ext` is neither `True` nor `False`.
    pub fn command(config: &PipelineConfig) -> Result<ExternalCommand> {
        let bin = config.require_option("bin")?;
        let drivers = config.require_option("drivers_file")?;
        let alias = config.require_option("alias_file")?;

        let drivers_type = if parse_flag(config, "drivers_ext")? {
            "ext"
        } else {
            "ids"
        };

        let sources: Vec<String> = GRAPH_SOURCES
            .iter()
            .filter_map(|(option, name)| config.option(option).map(|f| format!("{}:{}", name, f)))
            .collect();
        if sources.is_empty() {
            anyhow::bail!(
                "at least one of biogrid_file, string_file or ppaxe_file must be set"
            );
        }

        let graphs = config.output_path("graphs").join("graphs");

        Ok(ExternalCommand::new(format!("{}/{}", bin, GRAPH_BUILDER))
            .arg(format!("{}:{}", drivers_type, drivers))
            .arg(alias)
            .arg(graphs.to_string_lossy())
            .args(sources))
    }
}

#[async_trait]
impl JobAction for BuildGraph {
    async fn execute(&self, ctx: &JobContext) -> Result<()> {
        let command = Self::command(&ctx.config)?;
        command.execute(ctx).await
    }
}

/// Exports the graph edges as a neo4j import CSV
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgesToCsv;

impl EdgesToCsv {
    /// Assembles the edge exporter invocation from the configuration
    pub fn command(config: &PipelineConfig) -> Result<ExternalCommand> {
        let bin = config.require_option("bin")?;

        Ok(ExternalCommand::new(format!("{}/{}", bin, EDGE_EXPORTER))
            .arg("-wholegraph")
            .arg(graphs_path(config, "graphs_wholegraph.dot"))
            .arg("-alias")
            .arg(graphs_path(config, "graphs_IDalias.tbl"))
            .arg("-json")
            .arg(graphs_path(config, "graphs_wholegraph.json"))
            .args(level_args(config))
            .arg("-output")
            .arg(config.output_path("neo4j").join("edges.csv").to_string_lossy()))
    }
}

#[async_trait]
impl JobAction for EdgesToCsv {
    async fn execute(&self, ctx: &JobContext) -> Result<()> {
        Self::command(&ctx.config)?.execute(ctx).await
    }
}

/// Exports the graph nodes as a neo4j import CSV
#[derive(Debug, Clone, Copy, Default)]
pub struct NodesToCsv;

impl NodesToCsv {
    /// Assembles the node exporter invocation from the configuration
    ///
    /// `nvariants_file` is passed along only when it is set.
    pub fn command(config: &PipelineConfig) -> Result<ExternalCommand> {
        let bin = config.require_option("bin")?;
        let drivers = config.require_option("drivers_file")?;

        let mut command = ExternalCommand::new(format!("{}/{}", bin, NODE_EXPORTER))
            .arg("-wholegraph")
            .arg(graphs_path(config, "graphs_wholegraph.dot"))
            .arg("-alias")
            .arg(graphs_path(config, "graphs_IDalias.tbl"));
        if let Some(nvariants) = config.option("nvariants_file") {
            command = command.arg("-nvariants").arg(nvariants);
        }

        Ok(command
            .arg("-drivers")
            .arg(drivers)
            .args(level_args(config))
            .arg("-output")
            .arg(config.output_path("neo4j").join("nodes.csv").to_string_lossy()))
    }
}

#[async_trait]
impl JobAction for NodesToCsv {
    async fn execute(&self, ctx: &JobContext) -> Result<()> {
        Self::command(&ctx.config)?.execute(ctx).await
    }
}

fn graphs_path(config: &PipelineConfig, file: &str) -> String {
    config
        .output_path("graphs")
        .join(file)
        .to_string_lossy()
        .into_owned()
}

/// `-maxlvl` and the per-level graph file prefix
fn level_args(config: &PipelineConfig) -> [String; 4] {
    [
        "-maxlvl".to_string(),
        MAX_GRAPH_LEVEL.to_string(),
        "-prefix".to_string(),
        graphs_path(config, "graphs_graph_lvl+"),
    ]
}

/// Reads a `True`/`False` option, absent meaning false
fn parse_flag(config: &PipelineConfig, key: &str) -> Result<bool> {
    match config.option(key) {
        None => Ok(false),
        Some(value) if value.eq_ignore_ascii_case("true") => Ok(true),
        Some(value) if value.eq_ignore_ascii_case("false") => Ok(false),
        Some(value) => anyhow::bail!("option {} has to be True or False, got '{}'", key, value),
    }
}

/// The netcutter build pipeline, in execution order
pub fn default_registry() -> netcutter_core::Result<JobRegistry> {
    let mut registry = JobRegistry::new();
    registry.register("CreateDirectories", ["build"], |_| CreateDirectories)?;
    registry.register("BuildGraph", ["build"], |_| BuildGraph)?;
    registry.register("EdgesToCsv", ["neo4j"], |_| EdgesToCsv)?;
    registry.register("NodesToCsv", ["neo4j"], |_| NodesToCsv)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcutter_core::PipelineError;
    use netcutter_runner::JobScheduler;
    use std::sync::Arc;
    use uuid::Uuid;

    fn graph_config() -> PipelineConfig {
        PipelineConfig::default()
            .with_output_dir("/data/out")
            .with_option("bin", "/opt/netcutter/bin")
            .with_option("drivers_file", "drivers.txt")
            .with_option("alias_file", "alias.txt")
            .with_option("biogrid_file", "biogrid.tbl")
            .with_option("ppaxe_file", "ppaxe.tbl")
    }

    #[test]
    fn test_default_registry_order() {
        let registry = default_registry().unwrap();
        let names: Vec<&str> = registry.jobs().iter().map(|j| j.name()).collect();
        assert_eq!(
            names,
            vec!["CreateDirectories", "BuildGraph", "EdgesToCsv", "NodesToCsv"]
        );
        assert!(registry.jobs()[..2].iter().all(|j| j.definition().tags().contains("build")));
        assert!(registry.jobs()[2..].iter().all(|j| j.definition().tags().contains("neo4j")));
    }

    #[test]
    fn test_default_registry_selection_by_tag() {
        let registry = default_registry().unwrap();
        let config = PipelineConfig::default()
            .with_tags(["neo4j"])
            .with_stop_at("EdgesToCsv");

        let jobs = JobScheduler::new(&registry).jobs_in_range(&config).unwrap();
        let names: Vec<&str> = jobs.iter().map(|j| j.name()).collect();
        assert_eq!(names, vec!["EdgesToCsv"]);

        let config = PipelineConfig::default()
            .with_tags(["neo4j"])
            .with_start_at("BuildGraph");
        let err = JobScheduler::new(&registry).jobs_in_range(&config).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_edges_to_csv_command() {
        let command = EdgesToCsv::command(&graph_config()).unwrap();
        assert_eq!(
            command.program().to_string_lossy(),
            "/opt/netcutter/bin/edge2neo4jcsv.pl"
        );
        assert_eq!(
            command.arguments(),
            [
                "-wholegraph",
                "/data/out/graphs/graphs_wholegraph.dot",
                "-alias",
                "/data/out/graphs/graphs_IDalias.tbl",
                "-json",
                "/data/out/graphs/graphs_wholegraph.json",
                "-maxlvl",
                "4",
                "-prefix",
                "/data/out/graphs/graphs_graph_lvl+",
                "-output",
                "/data/out/neo4j/edges.csv",
            ]
        );
    }

    #[test]
    fn test_nodes_to_csv_command() {
        let command = NodesToCsv::command(&graph_config()).unwrap();
        assert_eq!(
            command.program().to_string_lossy(),
            "/opt/netcutter/bin/node2neo4jcsv.pl"
        );
        assert_eq!(
            command.arguments(),
            [
                "-wholegraph",
                "/data/out/graphs/graphs_wholegraph.dot",
                "-alias",
                "/data/out/graphs/graphs_IDalias.tbl",
                "-drivers",
                "drivers.txt",
                "-maxlvl",
                "4",
                "-prefix",
                "/data/out/graphs/graphs_graph_lvl+",
                "-output",
                "/data/out/neo4j/nodes.csv",
            ]
        );
    }

    #[test]
    fn test_nodes_to_csv_with_variants() {
        let config = graph_config().with_option("nvariants_file", "nvariants.tbl");
        let command = NodesToCsv::command(&config).unwrap();
        assert_eq!(&command.arguments()[4..6], ["-nvariants", "nvariants.tbl"]);
        assert_eq!(command.arguments()[6], "-drivers");

        let mut config = graph_config();
        config.options.remove("drivers_file");
        assert!(NodesToCsv::command(&config).is_err());
    }

    #[tokio::test]
    async fn test_create_directories() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = JobContext {
            run_id: Uuid::new_v4(),
            job_name: "CreateDirectories".to_string(),
            config: Arc::new(PipelineConfig::default().with_output_dir(dir.path())),
        };

        CreateDirectories.execute(&ctx).await.unwrap();
        for directory in DIRECTORIES {
            assert!(dir.path().join(directory).is_dir(), "{directory}");
        }

        // Existing directories are not an error
        CreateDirectories.execute(&ctx).await.unwrap();
    }

    #[test]
    fn test_build_graph_command() {
        let command = BuildGraph::command(&graph_config()).unwrap();
        assert_eq!(
            command.program().to_string_lossy(),
            "/opt/netcutter/bin/filter_interactions_to_graph.pl"
        );
        assert_eq!(
            command.arguments(),
            [
                "ids:drivers.txt",
                "alias.txt",
                "/data/out/graphs/graphs",
                "biogrid:biogrid.tbl",
                "ppaxe:ppaxe.tbl",
            ]
        );
    }

    #[test]
    fn test_build_graph_external_drivers() {
        let config = graph_config().with_option("drivers_ext", "TRUE");
        let command = BuildGraph::command(&config).unwrap();
        assert_eq!(command.arguments()[0], "ext:drivers.txt");

        let config = graph_config().with_option("drivers_ext", "false");
        let command = BuildGraph::command(&config).unwrap();
        assert_eq!(command.arguments()[0], "ids:drivers.txt");
    }

    #[test]
    fn test_build_graph_rejects_invalid_flag() {
        let config = graph_config().with_option("drivers_ext", "yes");
        let err = BuildGraph::command(&config).unwrap_err();
        assert!(err.to_string().contains("drivers_ext"));
    }

    #[test]
    fn test_build_graph_requires_options() {
        let config = PipelineConfig::default().with_option("bin", "/opt/bin");
        let err = BuildGraph::command(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Configuration(_))
        ));

        let mut config = graph_config();
        config.options.remove("biogrid_file");
        config.options.remove("ppaxe_file");
        assert!(BuildGraph::command(&config).is_err());
    }

    #[tokio::test]
    async fn test_build_graph_fails_when_misconfigured() {
        let ctx = JobContext {
            run_id: Uuid::new_v4(),
            job_name: "BuildGraph".to_string(),
            config: Arc::new(PipelineConfig::default()),
        };
        assert!(BuildGraph.execute(&ctx).await.is_err());
    }
}
