//! Experiment Record - one training run as seen by the monitor

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ExperimentId, SuccessClass, TrainingProgress};

/// Configuration name reported when the pipeline did not record one.
pub const DEFAULT_CONFIG_NAME: &str = "default";

/// Experiment Record represents one tracked training run.
///
/// Everything except the bookmark flag is written by the training pipeline
/// and read-only here. `hps` and `env_meta` keep the order in which the
/// pipeline wrote them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentRecord {
    id: ExperimentId,
    env: String,
    config_name: String,
    hps: Map<String, Value>,
    env_meta: Map<String, Value>,
    date: String,
    host: String,
    iterations: Option<u64>,
    max_reward: Option<f64>,
    bookmark: bool,
    success: SuccessClass,
}

impl ExperimentRecord {
    /// Create a record with no metadata, no progress and no bookmark.
    #[must_use]
    pub fn new(id: ExperimentId, env: impl Into<String>) -> Self {
        ExperimentRecordBuilder::new(id, env).build()
    }

    /// Create a builder for constructing a record with optional fields.
    #[must_use]
    pub fn builder(id: ExperimentId, env: impl Into<String>) -> ExperimentRecordBuilder {
        ExperimentRecordBuilder::new(id, env)
    }

    /// Get the experiment id.
    #[must_use]
    pub const fn id(&self) -> ExperimentId {
        self.id
    }

    /// Get the environment name.
    #[must_use]
    pub fn env(&self) -> &str {
        &self.env
    }

    /// Get the configuration variant name.
    #[must_use]
    pub fn config_name(&self) -> &str {
        &self.config_name
    }

    /// Get the hyperparameters, in recorded order.
    #[must_use]
    pub const fn hps(&self) -> &Map<String, Value> {
        &self.hps
    }

    /// Get the environment attributes, in recorded order.
    #[must_use]
    pub const fn env_meta(&self) -> &Map<String, Value> {
        &self.env_meta
    }

    /// Get the recorded start date.
    #[must_use]
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Get the host the run was started on.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Get the number of completed iterations.
    ///
    /// `None` when the progress file exists but could not be read, for
    /// instance while the pipeline is rewriting it.
    #[must_use]
    pub const fn iterations(&self) -> Option<u64> {
        self.iterations
    }

    /// Get the best reward observed, if any iteration completed.
    #[must_use]
    pub const fn max_reward(&self) -> Option<f64> {
        self.max_reward
    }

    /// Whether the experiment is bookmarked.
    #[must_use]
    pub const fn bookmark(&self) -> bool {
        self.bookmark
    }

    /// Get the upstream success classification.
    #[must_use]
    pub const fn success(&self) -> SuccessClass {
        self.success
    }

    /// An empty experiment never completed an iteration.
    ///
    /// Unknown progress is never empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self.iterations, Some(0))
    }

    /// A short experiment stopped before `threshold` iterations.
    ///
    /// Unknown progress is never short.
    #[must_use]
    pub const fn is_short(&self, threshold: u64) -> bool {
        match self.iterations {
            Some(iterations) => iterations < threshold,
            None => false,
        }
    }

    pub(crate) fn set_bookmark(&mut self, bookmark: bool) {
        self.bookmark = bookmark;
    }
}

/// Builder for `ExperimentRecord`.
#[derive(Debug)]
pub struct ExperimentRecordBuilder {
    record: ExperimentRecord,
}

impl ExperimentRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(id: ExperimentId, env: impl Into<String>) -> Self {
        Self {
            record: ExperimentRecord {
                id,
                env: env.into(),
                config_name: DEFAULT_CONFIG_NAME.to_string(),
                hps: Map::new(),
                env_meta: Map::new(),
                date: String::new(),
                host: String::new(),
                iterations: Some(0),
                max_reward: None,
                bookmark: false,
                success: SuccessClass::Unknown,
            },
        }
    }

    /// Set the configuration variant name.
    #[must_use]
    pub fn config_name(mut self, config_name: impl Into<String>) -> Self {
        self.record.config_name = config_name.into();
        self
    }

    /// Replace all hyperparameters.
    #[must_use]
    pub fn hps(mut self, hps: Map<String, Value>) -> Self {
        self.record.hps = hps;
        self
    }

    /// Append one hyperparameter.
    #[must_use]
    pub fn hp(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.record.hps.insert(name.into(), value.into());
        self
    }

    /// Replace all environment attributes.
    #[must_use]
    pub fn env_meta(mut self, env_meta: Map<String, Value>) -> Self {
        self.record.env_meta = env_meta;
        self
    }

    /// Append one environment attribute.
    #[must_use]
    pub fn env_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.record.env_meta.insert(name.into(), value.into());
        self
    }

    /// Set the recorded start date.
    #[must_use]
    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.record.date = date.into();
        self
    }

    /// Set the host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.record.host = host.into();
        self
    }

    /// Set the completed iteration count.
    #[must_use]
    pub const fn iterations(mut self, iterations: u64) -> Self {
        self.record.iterations = Some(iterations);
        self
    }

    /// Set the best observed reward.
    #[must_use]
    pub const fn max_reward(mut self, max_reward: Option<f64>) -> Self {
        self.record.max_reward = max_reward;
        self
    }

    /// Take iteration count and best reward from recorded progress.
    #[must_use]
    pub fn progress(mut self, progress: &TrainingProgress) -> Self {
        self.record.iterations = Some(progress.iterations());
        self.record.max_reward = progress.max_reward();
        self
    }

    /// Mark the progress as unreadable: iterations and best reward unknown.
    #[must_use]
    pub const fn unknown_progress(mut self) -> Self {
        self.record.iterations = None;
        self.record.max_reward = None;
        self
    }

    /// Set the bookmark flag.
    #[must_use]
    pub const fn bookmark(mut self, bookmark: bool) -> Self {
        self.record.bookmark = bookmark;
        self
    }

    /// Set the success classification.
    #[must_use]
    pub const fn success(mut self, success: SuccessClass) -> Self {
        self.record.success = success;
        self
    }

    /// Build the `ExperimentRecord`.
    #[must_use]
    pub fn build(self) -> ExperimentRecord {
        self.record
    }
}
