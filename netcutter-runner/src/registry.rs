//! Job registry
//!
//! The ordered catalogue of jobs a pipeline can run. Registration order is the
//! execution order; every selection step keeps it.

use netcutter_core::domain::job::JobDefinition;
use netcutter_core::domain::pipeline::PipelineConfig;
use netcutter_core::error::{PipelineError, Result};
use std::sync::Arc;

use crate::job::JobAction;

/// Builds a job's action from the shared configuration
pub type JobFactory = Arc<dyn Fn(&PipelineConfig) -> Arc<dyn JobAction> + Send + Sync>;

/// A registry entry: the job's definition and how to instantiate it
#[derive(Clone)]
pub struct RegisteredJob {
    definition: JobDefinition,
    factory: JobFactory,
}

impl RegisteredJob {
    pub fn definition(&self) -> &JobDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Creates the job's action for one run
    pub fn instantiate(&self, config: &PipelineConfig) -> Arc<dyn JobAction> {
        (self.factory)(config)
    }
}

impl std::fmt::Debug for RegisteredJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredJob")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

/// Ordered registry of pipeline jobs
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: Vec<RegisteredJob>,
}

impl JobRegistry {
    /// Creates a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a job to the end of the pipeline
    ///
    /// # Arguments
    /// * `name` - Stable, unique job name (the resume key)
    /// * `tags` - Labels used by the tag filter
    /// * `factory` - Builds the job's action from the pipeline configuration
    ///
    /// # Errors
    /// Returns a configuration error if a job with the same name is already registered
    pub fn register<I, T, F, A>(&mut self, name: &str, tags: I, factory: F) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
        F: Fn(&PipelineConfig) -> A + Send + Sync + 'static,
        A: JobAction + 'static,
    {
        if self.get(name).is_some() {
            return Err(PipelineError::Configuration(format!(
                "job '{}' is already registered",
                name
            )));
        }

        self.jobs.push(RegisteredJob {
            definition: JobDefinition::new(name, tags),
            factory: Arc::new(move |config: &PipelineConfig| {
                Arc::new(factory(config)) as Arc<dyn JobAction>
            }),
        });
        Ok(())
    }

    /// Gets a job by its name
    pub fn get(&self, name: &str) -> Option<&RegisteredJob> {
        self.jobs.iter().find(|job| job.name() == name)
    }

    /// Returns all jobs in execution order
    pub fn jobs(&self) -> &[RegisteredJob] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::UnimplementedJob;

    #[test]
    fn test_registration_order_is_kept() {
        let mut registry = JobRegistry::new();
        registry.register("CreateDirectories", ["build"], |_| UnimplementedJob).unwrap();
        registry.register("BuildGraph", ["build"], |_| UnimplementedJob).unwrap();
        registry.register("NodesToCsv", ["neo4j"], |_| UnimplementedJob).unwrap();

        let names: Vec<&str> = registry.jobs().iter().map(|j| j.name()).collect();
        assert_eq!(names, vec!["CreateDirectories", "BuildGraph", "NodesToCsv"]);
        assert_eq!(registry.len(), 3);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let mut registry = JobRegistry::new();
        registry.register("BuildGraph", ["build"], |_| UnimplementedJob).unwrap();

        let err = registry
            .register("BuildGraph", ["neo4j"], |_| UnimplementedJob)
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_by_name() {
        let mut registry = JobRegistry::new();
        registry.register("EdgesToCsv", ["neo4j", "csv"], |_| UnimplementedJob).unwrap();

        let job = registry.get("EdgesToCsv").unwrap();
        assert!(job.definition().tags().contains("csv"));
        assert!(registry.get("Missing").is_none());
    }
}
