//! Registry mutations triggered from the pages

use serde::Serialize;
use tracing::{info, warn};

use super::Monitor;
use crate::experiment::{ExperimentId, ExperimentRecord, ExperimentStore};
use crate::{Error, Result};

/// Result of a bulk delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearOutcome {
    /// Experiments actually removed.
    pub deleted: usize,
    /// Experiments that matched but could not be removed.
    pub failed: usize,
}

/// Acknowledgement that an evaluation was handed to the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EvaluationTicket {
    /// Always `true`; refusals are errors.
    pub accepted: bool,
    /// Experiment to be evaluated.
    pub id: ExperimentId,
}

impl<S: ExperimentStore> Monitor<S> {
    /// Toggle an experiment's bookmark and return the new flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id.
    pub async fn bookmark(&self, id: ExperimentId) -> Result<bool> {
        let bookmark = self.store.toggle_bookmark(id).await?;
        info!(%id, bookmark, "bookmark toggled");
        Ok(bookmark)
    }

    /// Delete an experiment and its artifacts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown or already deleted id and
    /// [`Error::StorageError`] if the removal failed.
    pub async fn delete(&self, id: ExperimentId) -> Result<()> {
        self.store.remove(id).await?;
        info!(%id, "experiment deleted");
        Ok(())
    }

    /// Delete every experiment without a completed iteration.
    ///
    /// # Errors
    ///
    /// Only fails if the registry snapshot cannot be taken.
    pub async fn clear_all_empty(&self) -> Result<ClearOutcome> {
        self.clear_where("empty", ExperimentRecord::is_empty).await
    }

    /// Delete every experiment with fewer iterations than the short threshold.
    ///
    /// # Errors
    ///
    /// Only fails if the registry snapshot cannot be taken.
    pub async fn clear_all_short(&self) -> Result<ClearOutcome> {
        let threshold = self.short_threshold;
        self.clear_where("short", move |record| record.is_short(threshold))
            .await
    }

    /// Hand an evaluation request for `id` to the evaluator.
    ///
    /// Returns as soon as the request is accepted; the run itself is not awaited.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id and
    /// [`Error::EvaluationUnavailable`] if the evaluator refused.
    pub async fn evaluate(&self, id: ExperimentId) -> Result<EvaluationTicket> {
        if !self.store.exists(id).await? {
            return Err(Error::NotFound(id));
        }
        self.evaluator.submit(id)?;
        info!(%id, "evaluation requested");
        Ok(EvaluationTicket { accepted: true, id })
    }

    async fn clear_where<F>(&self, label: &str, matches: F) -> Result<ClearOutcome>
    where
        F: Fn(&ExperimentRecord) -> bool + Send,
    {
        let doomed: Vec<ExperimentId> = self
            .store
            .list()
            .await?
            .iter()
            .filter(|record| matches(record))
            .map(ExperimentRecord::id)
            .collect();

        let mut outcome = ClearOutcome::default();
        for id in doomed {
            match self.store.remove(id).await {
                Ok(()) => outcome.deleted += 1,
                // Deleted concurrently; nothing left to do
                Err(Error::NotFound(_)) => {}
                Err(e) => {
                    warn!(%id, error = %e, "could not delete {label} experiment");
                    outcome.failed += 1;
                }
            }
        }

        info!(
            deleted = outcome.deleted,
            failed = outcome.failed,
            "cleared {label} experiments"
        );
        Ok(outcome)
    }
}
