//! Monitor configuration
//!
//! Layered with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. `monitor.toml` in the working directory, if present
//! 3. An explicit config file (`--config`)
//! 4. Environment variables prefixed with `MONITOR_` (`MONITOR_EVALUATION__COMMAND`, ...)
//!
//! Command-line flags are applied on top by the binary.

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Config file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "monitor.toml";

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "MONITOR_";

/// Iteration count below which an experiment counts as short.
pub const DEFAULT_SHORT_THRESHOLD: u64 = 10;

/// Top-level monitor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Interface to bind the HTTP server to.
    pub host: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Directory holding one sub-directory per experiment.
    pub experiments_dir: PathBuf,
    /// Experiments with fewer iterations are removed by "clear short".
    pub short_threshold: u64,
    /// Evaluation collaborator.
    pub evaluation: EvaluationConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            experiments_dir: PathBuf::from("monitor/static/experiments"),
            short_threshold: DEFAULT_SHORT_THRESHOLD,
            evaluation: EvaluationConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// `host:port` for binding.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// How evaluation requests are carried out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Program and arguments; `{id}` is replaced by the experiment id.
    /// Empty disables evaluation.
    pub command: Vec<String>,
    /// Directory to run the command in.
    pub working_dir: Option<PathBuf>,
}

/// The layered figment, before extraction.
#[must_use]
pub fn figment(config_file: Option<&Path>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(MonitorConfig::default()));

    let local = Path::new(DEFAULT_CONFIG_FILE);
    if local.exists() {
        figment = figment.merge(Toml::file(local));
    }

    if let Some(path) = config_file {
        figment = figment.merge(Toml::file(path));
    }

    figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load configuration from layered sources.
///
/// # Errors
///
/// Returns [`crate::Error::Config`] if a layer cannot be parsed or a value
/// has the wrong type.
pub fn load_config(config_file: Option<&Path>) -> Result<MonitorConfig> {
    if let Some(path) = config_file {
        if !path.exists() {
            return Err(crate::Error::Config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
    }
    Ok(figment(config_file).extract()?)
}
