//! Overview listing: bookmarked and other experiments, newest first

use serde::Serialize;
use tracing::debug;

use super::Monitor;
use crate::experiment::{ExperimentId, ExperimentRecord, ExperimentStore, SuccessClass};
use crate::Result;

/// One row of the overview table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentSummary {
    /// Experiment id.
    pub id: ExperimentId,
    /// Environment name.
    pub env: String,
    /// Configuration variant.
    pub config_name: String,
    /// Recorded start date.
    pub date: String,
    /// Host the run was started on.
    pub host: String,
    /// Completed iterations, `None` while the progress file is unreadable.
    pub iterations: Option<u64>,
    /// `iterations` formatted for display, `?` when unknown.
    pub iterations_display: String,
    /// Best observed reward.
    pub max_reward: Option<f64>,
    /// `max_reward` formatted for display, `-` for empty runs.
    pub max_reward_display: String,
    /// Bookmark flag.
    pub bookmark: bool,
    /// Upstream success classification.
    pub success: SuccessClass,
    /// Row highlight class derived from `success`.
    pub row_class: &'static str,
}

impl From<&ExperimentRecord> for ExperimentSummary {
    fn from(record: &ExperimentRecord) -> Self {
        Self {
            id: record.id(),
            env: record.env().to_string(),
            config_name: record.config_name().to_string(),
            date: record.date().to_string(),
            host: record.host().to_string(),
            iterations: record.iterations(),
            iterations_display: format_iterations(record.iterations()),
            max_reward: record.max_reward(),
            max_reward_display: format_reward(record.max_reward()),
            bookmark: record.bookmark(),
            success: record.success(),
            row_class: record.success().row_class(),
        }
    }
}

/// Display form of a reward: two decimals, or `-` when there is none.
#[must_use]
pub fn format_reward(reward: Option<f64>) -> String {
    reward.map_or_else(|| "-".to_string(), |r| format!("{r:.2}"))
}

/// Display form of an iteration count: the number, or `?` when unknown.
#[must_use]
pub fn format_iterations(iterations: Option<u64>) -> String {
    iterations.map_or_else(|| "?".to_string(), |n| n.to_string())
}

/// Which environment's experiments to show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EnvironmentFilter {
    /// Show every experiment.
    #[default]
    All,
    /// Show only experiments run on this environment.
    Named(String),
}

impl EnvironmentFilter {
    /// Filter from an optional environment name; `None` shows all.
    #[must_use]
    pub fn from_option(env: Option<String>) -> Self {
        env.map_or(Self::All, Self::Named)
    }

    /// Whether a row with environment `env` is shown.
    #[must_use]
    pub fn matches(&self, env: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(name) => name == env,
        }
    }
}

/// The overview page model.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Overview {
    /// Bookmarked experiments, id descending.
    pub bookmarked: Vec<ExperimentSummary>,
    /// All other experiments, id descending.
    pub others: Vec<ExperimentSummary>,
    /// Distinct environment names, descending, for the filter dropdown.
    pub environments: Vec<String>,
}

impl Overview {
    /// Partition and sort a registry snapshot.
    #[must_use]
    pub fn from_records(records: &[ExperimentRecord]) -> Self {
        let (mut bookmarked, mut others): (Vec<_>, Vec<_>) = records
            .iter()
            .map(ExperimentSummary::from)
            .partition(|summary| summary.bookmark);
        bookmarked.sort_by(|a, b| b.id.cmp(&a.id));
        others.sort_by(|a, b| b.id.cmp(&a.id));

        let mut environments: Vec<String> = records.iter().map(|r| r.env().to_string()).collect();
        environments.sort_by(|a, b| b.cmp(a));
        environments.dedup();

        Self {
            bookmarked,
            others,
            environments,
        }
    }

    /// Total number of experiments in both partitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bookmarked.len() + self.others.len()
    }

    /// Whether there are no experiments at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bookmarked.is_empty() && self.others.is_empty()
    }

    /// Copy of the overview with non-matching rows hidden.
    ///
    /// The environment list is kept whole so the filter can be changed again.
    #[must_use]
    pub fn filtered(&self, filter: &EnvironmentFilter) -> Self {
        let keep = |rows: &[ExperimentSummary]| -> Vec<ExperimentSummary> {
            rows.iter()
                .filter(|row| filter.matches(&row.env))
                .cloned()
                .collect()
        };
        Self {
            bookmarked: keep(&self.bookmarked),
            others: keep(&self.others),
            environments: self.environments.clone(),
        }
    }
}

impl<S: ExperimentStore> Monitor<S> {
    /// All experiments split into bookmarked and others, newest first.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn list_experiments(&self) -> Result<Overview> {
        let records = self.store.list().await?;
        let overview = Overview::from_records(&records);
        debug!(
            bookmarked = overview.bookmarked.len(),
            others = overview.others.len(),
            "listed experiments"
        );
        Ok(overview)
    }
}
