//! Evaluation collaborator
//!
//! The monitor only *requests* evaluations; running them is somebody else's
//! job. The shipped [`CommandEvaluator`] launches an external program and
//! walks away, leaving a background task to log how it exited.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;
use tracing::{info, warn};

use crate::config::EvaluationConfig;
use crate::experiment::ExperimentId;
use crate::{Error, Result};

/// Placeholder replaced by the experiment id in command arguments.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Accepts evaluation requests without waiting for them to finish.
pub trait Evaluator: Send + Sync {
    /// Submit an evaluation run for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EvaluationUnavailable`] if the request could not be
    /// handed over.
    fn submit(&self, id: ExperimentId) -> Result<()>;
}

/// Evaluator used when nothing is configured: every request is refused.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableEvaluator;

impl Evaluator for UnavailableEvaluator {
    fn submit(&self, _id: ExperimentId) -> Result<()> {
        Err(Error::EvaluationUnavailable(
            "no evaluation command configured".to_string(),
        ))
    }
}

/// Launches a configured command per evaluation request.
///
/// Every argument has `{id}` replaced by the experiment id. Must be used from
/// within a tokio runtime.
#[derive(Debug, Clone)]
pub struct CommandEvaluator {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl CommandEvaluator {
    /// Create an evaluator running `program` with `args`.
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
        }
    }

    /// Split a command line (`[program, args...]`); `None` if it is empty.
    #[must_use]
    pub fn from_command_line(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }

    /// Run the command inside `dir`.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// The program to launch.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments for one experiment, placeholders substituted.
    #[must_use]
    pub fn args_for(&self, id: ExperimentId) -> Vec<String> {
        let id = id.to_string();
        self.args
            .iter()
            .map(|arg| arg.replace(ID_PLACEHOLDER, &id))
            .collect()
    }
}

impl Evaluator for CommandEvaluator {
    fn submit(&self, id: ExperimentId) -> Result<()> {
        let mut command = Command::new(&self.program);
        command.args(self.args_for(id)).stdin(Stdio::null());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| {
            Error::EvaluationUnavailable(format!("failed to launch {}: {e}", self.program))
        })?;
        info!(%id, program = %self.program, pid = ?child.id(), "evaluation launched");

        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => info!(%id, "evaluation finished"),
                Ok(status) => warn!(%id, %status, "evaluation exited with failure"),
                Err(e) => warn!(%id, error = %e, "lost track of evaluation process"),
            }
        });
        Ok(())
    }
}

/// Build the evaluator described by the configuration.
#[must_use]
pub fn evaluator_from_config(config: &EvaluationConfig) -> Arc<dyn Evaluator> {
    match CommandEvaluator::from_command_line(&config.command) {
        Some(evaluator) => match &config.working_dir {
            Some(dir) => Arc::new(evaluator.with_working_dir(dir)),
            None => Arc::new(evaluator),
        },
        None => Arc::new(UnavailableEvaluator),
    }
}
