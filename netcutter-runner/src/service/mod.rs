//! Service layer
//!
//! Services contain the business logic of the runner: driving a pipeline run
//! and delegating job work to external programs.

mod command;
mod pipeline;

pub use command::{CommandOutput, ExternalCommand};
pub use pipeline::{PipelineRunner, RunSummary};
