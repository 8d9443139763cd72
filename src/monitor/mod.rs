//! Monitor services
//!
//! [`Monitor`] binds an [`ExperimentStore`] to the read models the pages
//! render ([`listing`], [`detail`]) and to the narrow mutations the pages
//! trigger ([`mutation`]).
//!
//! Mutations do not patch any view. Callers re-fetch after a successful
//! mutation, and only that re-fetch is guaranteed to observe it.

pub mod detail;
pub mod listing;
pub mod mutation;

use std::sync::Arc;

use crate::config::{MonitorConfig, DEFAULT_SHORT_THRESHOLD};
use crate::evaluate::{evaluator_from_config, Evaluator, UnavailableEvaluator};
use crate::experiment::ExperimentStore;
use crate::Result;

pub use detail::{neighbours, Entry, ExperimentView};
pub use listing::{EnvironmentFilter, ExperimentSummary, Overview};
pub use mutation::{ClearOutcome, EvaluationTicket};

/// Listing, detail and mutation services over one experiment store.
pub struct Monitor<S> {
    store: S,
    evaluator: Arc<dyn Evaluator>,
    short_threshold: u64,
}

impl<S: ExperimentStore> Monitor<S> {
    /// Monitor with evaluation disabled and the default short threshold.
    pub fn new(store: S) -> Self {
        Self {
            store,
            evaluator: Arc::new(UnavailableEvaluator),
            short_threshold: DEFAULT_SHORT_THRESHOLD,
        }
    }

    /// Monitor configured from [`MonitorConfig`].
    pub fn from_config(store: S, config: &MonitorConfig) -> Self {
        Self {
            store,
            evaluator: evaluator_from_config(&config.evaluation),
            short_threshold: config.short_threshold,
        }
    }

    /// Use `evaluator` for evaluation requests.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Set the iteration count below which an experiment is short.
    #[must_use]
    pub const fn with_short_threshold(mut self, short_threshold: u64) -> Self {
        self.short_threshold = short_threshold;
        self
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Iteration count below which an experiment is short.
    pub const fn short_threshold(&self) -> u64 {
        self.short_threshold
    }

    /// Open the store. Call once before serving.
    ///
    /// # Errors
    ///
    /// Propagates the store's failure to open.
    pub async fn open(&self) -> Result<()> {
        self.store.open().await
    }

    /// Close the store after the last request.
    ///
    /// # Errors
    ///
    /// Propagates the store's failure to close.
    pub async fn close(&self) -> Result<()> {
        self.store.close().await
    }
}

impl<S> std::fmt::Debug for Monitor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("short_threshold", &self.short_threshold)
            .finish_non_exhaustive()
    }
}
