//! Error types for the experiment monitor
//!
//! Every failure a request can hit maps onto one of these variants, and each
//! variant has a stable [`Error::kind`] string that the JSON API reports.

use thiserror::Error;

use crate::experiment::ExperimentId;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Experiment monitor error types
#[derive(Error, Debug)]
pub enum Error {
    /// No experiment with this id exists in the registry
    #[error("Experiment {0} not found")]
    NotFound(ExperimentId),

    /// The experiment exists but has no artifact with this name
    #[error("Artifact {name} of experiment {id} not found")]
    ArtifactNotFound {
        /// Experiment the artifact was requested from
        id: ExperimentId,
        /// Requested file name
        name: String,
    },

    /// Malformed request body, id or artifact name
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The evaluation collaborator is not configured or could not be reached
    #[error("Evaluation unavailable: {0}")]
    EvaluationUnavailable(String),

    /// Registry or filesystem failure while reading or mutating an experiment
    #[error("Storage error: {0}")]
    StorageError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Template registration or rendering failed
    #[error("Template error: {0}")]
    Template(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Stable, machine-readable kind reported alongside the message.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) | Self::ArtifactNotFound { .. } => "not_found",
            Self::Validation(_) => "validation",
            Self::EvaluationUnavailable(_) => "evaluation_unavailable",
            Self::StorageError(_) | Self::Io(_) | Self::Json(_) => "storage",
            Self::Template(_) => "template",
            Self::Config(_) => "config",
        }
    }
}

impl From<handlebars::RenderError> for Error {
    fn from(err: handlebars::RenderError) -> Self {
        Self::Template(err.to_string())
    }
}

impl From<handlebars::TemplateError> for Error {
    fn from(err: handlebars::TemplateError) -> Self {
        Self::Template(err.to_string())
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}
