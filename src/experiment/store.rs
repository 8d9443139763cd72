//! Experiment Store - the registry interface the monitor services run on

use std::future::Future;

use super::{ExperimentId, ExperimentRecord};
use crate::{Error, Result};

/// Registry of experiments.
///
/// Implementations serialize mutations of the same experiment: toggling a
/// bookmark is last-writer-wins, and of two concurrent removals of one id
/// exactly one succeeds while the other fails with [`Error::NotFound`].
///
/// The store has an explicit lifecycle: [`open`](Self::open) once before the
/// first request, [`close`](Self::close) after the last.
pub trait ExperimentStore: Send + Sync {
    /// Prepare the store for use.
    fn open(&self) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }

    /// Release the store, waiting for in-flight mutations.
    fn close(&self) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }

    /// Snapshot of every experiment, in no particular order.
    fn list(&self) -> impl Future<Output = Result<Vec<ExperimentRecord>>> + Send;

    /// Ids of every experiment, in no particular order.
    ///
    /// Backends that can enumerate ids without loading records override this.
    fn ids(&self) -> impl Future<Output = Result<Vec<ExperimentId>>> + Send {
        async move { Ok(self.list().await?.iter().map(ExperimentRecord::id).collect()) }
    }

    /// Look up one experiment.
    ///
    /// Returns `None` if the id is unknown.
    fn get(&self, id: ExperimentId) -> impl Future<Output = Result<Option<ExperimentRecord>>> + Send;

    /// Flip the bookmark flag and return its new value.
    fn toggle_bookmark(&self, id: ExperimentId) -> impl Future<Output = Result<bool>> + Send;

    /// Remove an experiment together with its artifacts.
    ///
    /// Either the experiment is gone afterwards or it is left untouched.
    fn remove(&self, id: ExperimentId) -> impl Future<Output = Result<()>> + Send;

    /// Names of the files stored alongside an experiment, sorted.
    fn artifacts(&self, id: ExperimentId) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Raw bytes of one artifact.
    fn read_artifact(
        &self,
        id: ExperimentId,
        name: &str,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Check if an experiment exists.
    fn exists(&self, id: ExperimentId) -> impl Future<Output = Result<bool>> + Send {
        async move { Ok(self.get(id).await?.is_some()) }
    }
}

/// Reject artifact names that could escape the experiment's own files.
///
/// # Errors
///
/// Returns [`Error::Validation`] for empty names, hidden files and anything
/// containing a path separator or `..`.
pub fn validate_artifact_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.contains("..")
        || name.contains('\0')
    {
        return Err(Error::Validation(format!("invalid artifact name {name:?}")));
    }
    Ok(())
}
