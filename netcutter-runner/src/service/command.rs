//! External command action
//!
//! Runs a separate executable as a job's side effect. The call blocks the
//! pipeline until the process exits; a non-zero exit fails the job.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::job::{JobAction, JobContext};

/// Captured output of a finished process
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// A program invocation that can be used as a job action
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: PathBuf,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl ExternalCommand {
    /// Creates a command running `program` with no arguments
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Runs the process to completion
    ///
    /// # Errors
    /// Returns an error if the process cannot be started or exits unsuccessfully.
    /// The error message carries the process's stderr.
    pub async fn run(&self) -> Result<CommandOutput> {
        debug!("Executing process: {} {:?}", self.program.display(), self.args);

        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }

        let output = command
            .output()
            .await
            .with_context(|| format!("Failed to start {}", self.program.display()))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        log_output(&stdout, false);
        log_output(&stderr, true);

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "none (terminated by signal)".to_string());
            anyhow::bail!(
                "{} failed with exit code {}: {}",
                self.program.display(),
                code,
                stderr.trim()
            );
        }

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout,
            stderr,
        })
    }
}

impl std::fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[async_trait]
impl JobAction for ExternalCommand {
    async fn execute(&self, ctx: &JobContext) -> Result<()> {
        info!("{}: running {}", ctx.job_name, self);
        self.run().await?;
        Ok(())
    }
}

/// Forwards process output to the log, one event per line
fn log_output(output: &str, is_stderr: bool) {
    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if is_stderr {
            warn!("{}", line);
        } else {
            debug!("{}", line);
        }
    }
}
