//! In-memory experiment store using `DashMap`.
//!
//! Nothing survives a restart. Used by tests and by embedders that feed the
//! monitor from their own pipeline instead of the on-disk layout.

use std::collections::BTreeMap;

use dashmap::DashMap;

use super::store::validate_artifact_name;
use super::{ExperimentId, ExperimentRecord, ExperimentStore};
use crate::{Error, Result};

/// In-memory experiment registry backed by a lock-free concurrent hashmap.
///
/// Bookmark toggles run under the entry's shard lock and removal is a single
/// map operation, so concurrent mutations of one id never interleave.
///
/// # Example
///
/// ```rust
/// use experiment_monitor::experiment::{
///     ExperimentId, ExperimentRecord, ExperimentStore, MemoryExperimentStore,
/// };
///
/// # async fn example() -> experiment_monitor::Result<()> {
/// let store = MemoryExperimentStore::new();
/// store.insert(ExperimentRecord::new(ExperimentId::new(1), "CartPole-v1"));
/// assert!(store.toggle_bookmark(ExperimentId::new(1)).await?);
/// # Ok(())
/// # }
/// ```
pub struct MemoryExperimentStore {
    experiments: DashMap<ExperimentId, ExperimentRecord>,
    artifacts: DashMap<ExperimentId, BTreeMap<String, Vec<u8>>>,
}

impl MemoryExperimentStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            experiments: DashMap::new(),
            artifacts: DashMap::new(),
        }
    }

    /// Create with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            experiments: DashMap::with_capacity(capacity),
            artifacts: DashMap::new(),
        }
    }

    /// Add or replace an experiment, returning the record it replaced.
    pub fn insert(&self, record: ExperimentRecord) -> Option<ExperimentRecord> {
        self.experiments.insert(record.id(), record)
    }

    /// Attach a file to an experiment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id and [`Error::Validation`]
    /// for names that are not plain file names.
    pub fn put_artifact(
        &self,
        id: ExperimentId,
        name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<()> {
        let name = name.into();
        validate_artifact_name(&name)?;
        // Held across the insert so a concurrent remove also drops these bytes
        let _record = self.experiments.get(&id).ok_or(Error::NotFound(id))?;
        self.artifacts.entry(id).or_default().insert(name, bytes);
        Ok(())
    }

    /// Get the number of experiments in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }

    /// Clear all experiments and artifacts.
    pub fn clear(&self) {
        self.experiments.clear();
        self.artifacts.clear();
    }
}

impl Default for MemoryExperimentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<ExperimentRecord> for MemoryExperimentStore {
    fn from_iter<I: IntoIterator<Item = ExperimentRecord>>(iter: I) -> Self {
        let store = Self::new();
        for record in iter {
            store.insert(record);
        }
        store
    }
}

impl ExperimentStore for MemoryExperimentStore {
    async fn list(&self) -> Result<Vec<ExperimentRecord>> {
        Ok(self
            .experiments
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn ids(&self) -> Result<Vec<ExperimentId>> {
        Ok(self.experiments.iter().map(|entry| *entry.key()).collect())
    }

    async fn get(&self, id: ExperimentId) -> Result<Option<ExperimentRecord>> {
        Ok(self.experiments.get(&id).map(|entry| entry.value().clone()))
    }

    async fn toggle_bookmark(&self, id: ExperimentId) -> Result<bool> {
        let mut entry = self.experiments.get_mut(&id).ok_or(Error::NotFound(id))?;
        let bookmark = !entry.bookmark();
        entry.set_bookmark(bookmark);
        Ok(bookmark)
    }

    async fn remove(&self, id: ExperimentId) -> Result<()> {
        self.experiments.remove(&id).ok_or(Error::NotFound(id))?;
        self.artifacts.remove(&id);
        Ok(())
    }

    async fn artifacts(&self, id: ExperimentId) -> Result<Vec<String>> {
        if !self.experiments.contains_key(&id) {
            return Err(Error::NotFound(id));
        }
        Ok(self
            .artifacts
            .get(&id)
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn read_artifact(&self, id: ExperimentId, name: &str) -> Result<Vec<u8>> {
        validate_artifact_name(name)?;
        if !self.experiments.contains_key(&id) {
            return Err(Error::NotFound(id));
        }
        self.artifacts
            .get(&id)
            .and_then(|files| files.get(name).cloned())
            .ok_or_else(|| Error::ArtifactNotFound {
                id,
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn id(raw: u64) -> ExperimentId {
        ExperimentId::new(raw)
    }

    #[tokio::test]
    async fn test_memory_store_insert_get() {
        let store = MemoryExperimentStore::new();
        store.insert(ExperimentRecord::new(id(1), "CartPole-v1"));

        let record = store.get(id(1)).await.unwrap().unwrap();
        assert_eq!(record.env(), "CartPole-v1");
        assert!(store.get(id(2)).await.unwrap().is_none());
        assert!(store.exists(id(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_toggle_bookmark() {
        let store = MemoryExperimentStore::new();
        store.insert(ExperimentRecord::new(id(1), "CartPole-v1"));

        assert!(store.toggle_bookmark(id(1)).await.unwrap());
        assert!(store.get(id(1)).await.unwrap().unwrap().bookmark());
        assert!(!store.toggle_bookmark(id(1)).await.unwrap());
        assert!(matches!(
            store.toggle_bookmark(id(9)).await,
            Err(Error::NotFound(missing)) if missing == id(9)
        ));
    }

    #[tokio::test]
    async fn test_memory_store_remove_twice() {
        let store = MemoryExperimentStore::new();
        store.insert(ExperimentRecord::new(id(1), "CartPole-v1"));
        store.put_artifact(id(1), "model.png", vec![1, 2, 3]).unwrap();

        store.remove(id(1)).await.unwrap();
        assert!(store.is_empty());
        assert!(matches!(store.remove(id(1)).await, Err(Error::NotFound(_))));
        assert!(matches!(
            store.read_artifact(id(1), "model.png").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_store_artifacts_sorted() {
        let store = MemoryExperimentStore::new();
        store.insert(ExperimentRecord::new(id(1), "CartPole-v1"));
        store.put_artifact(id(1), "reward_plot.svg", vec![]).unwrap();
        store.put_artifact(id(1), "model.png", vec![7]).unwrap();

        assert_eq!(
            store.artifacts(id(1)).await.unwrap(),
            vec!["model.png".to_string(), "reward_plot.svg".to_string()]
        );
        assert_eq!(store.read_artifact(id(1), "model.png").await.unwrap(), vec![7]);
        assert!(matches!(
            store.read_artifact(id(1), "loss_plot.svg").await,
            Err(Error::ArtifactNotFound { .. })
        ));
    }

    #[test]
    fn test_put_artifact_unknown_experiment() {
        let store = MemoryExperimentStore::new();
        assert!(matches!(
            store.put_artifact(id(1), "model.png", vec![]),
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_store_concurrent_remove() {
        let store = Arc::new(MemoryExperimentStore::new());
        store.insert(ExperimentRecord::new(id(1), "CartPole-v1"));

        let mut handles = vec![];
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.remove(id(1)).await.is_ok() }));
        }

        let mut removed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                removed += 1;
            }
        }
        assert_eq!(removed, 1);
    }

    #[test]
    fn test_memory_store_default() {
        let store = MemoryExperimentStore::default();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_put_artifact_racing_remove_leaves_no_orphans() {
        let store = Arc::new(MemoryExperimentStore::new());

        for round in 0..200 {
            store.insert(ExperimentRecord::new(id(round), "CartPole-v1"));

            let writer = {
                let store = Arc::clone(&store);
                tokio::task::spawn_blocking(move || {
                    let _ = store.put_artifact(id(round), "model.png", vec![1]);
                })
            };
            let remover = {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.remove(id(round)).await })
            };

            writer.await.unwrap();
            remover.await.unwrap().unwrap();
            assert!(store.artifacts.get(&id(round)).is_none(), "orphaned artifacts in round {round}");
        }
    }

    #[tokio::test]
    async fn test_ids_match_records() {
        let store: MemoryExperimentStore = [3, 7, 5]
            .into_iter()
            .map(|raw| ExperimentRecord::new(id(raw), "CartPole-v1"))
            .collect();

        let mut ids = store.ids().await.unwrap();
        ids.sort_unstable();
        assert_eq!(ids, [id(3), id(5), id(7)]);
    }
}
