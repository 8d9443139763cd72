//! Monitor service tests
//!
//! Listing, detail navigation and mutations over the in-memory store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use experiment_monitor::evaluate::Evaluator;
use experiment_monitor::experiment::{
    ExperimentId, ExperimentRecord, ExperimentStore, MemoryExperimentStore, SuccessClass,
};
use experiment_monitor::monitor::{ClearOutcome, Monitor};
use experiment_monitor::{Error, Result};

fn id(raw: u64) -> ExperimentId {
    ExperimentId::new(raw)
}

fn run(raw: u64, iterations: u64) -> ExperimentRecord {
    ExperimentRecord::builder(id(raw), "CartPole-v1")
        .iterations(iterations)
        .build()
}

/// A(3, empty), B(5, 10 iterations), C(7, empty)
fn abc_monitor() -> Monitor<MemoryExperimentStore> {
    Monitor::new([run(3, 0), run(5, 10), run(7, 0)].into_iter().collect())
}

fn ids(rows: &[experiment_monitor::monitor::ExperimentSummary]) -> Vec<u64> {
    rows.iter().map(|row| row.id.get()).collect()
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_listing_sorted_descending() {
    let monitor = abc_monitor();
    let overview = monitor.list_experiments().await.unwrap();

    assert!(overview.bookmarked.is_empty());
    assert_eq!(ids(&overview.others), [7, 5, 3]);
    assert_eq!(overview.environments, ["CartPole-v1"]);
}

#[tokio::test]
async fn test_bookmark_moves_between_partitions() {
    let monitor = abc_monitor();

    assert!(monitor.bookmark(id(5)).await.unwrap());
    let overview = monitor.list_experiments().await.unwrap();
    assert_eq!(ids(&overview.bookmarked), [5]);
    assert_eq!(ids(&overview.others), [7, 3]);

    assert!(!monitor.bookmark(id(5)).await.unwrap());
    let overview = monitor.list_experiments().await.unwrap();
    assert!(overview.bookmarked.is_empty());
    assert_eq!(ids(&overview.others), [7, 5, 3]);
}

#[tokio::test]
async fn test_bookmark_unknown_id() {
    let monitor = abc_monitor();
    assert!(matches!(
        monitor.bookmark(id(4)).await,
        Err(Error::NotFound(missing)) if missing == id(4)
    ));
}

#[tokio::test]
async fn test_success_highlighting() {
    let store: MemoryExperimentStore = [
        ExperimentRecord::builder(id(1), "Ant-v2")
            .success(SuccessClass::Success)
            .build(),
        ExperimentRecord::builder(id(2), "Ant-v2")
            .success(SuccessClass::Maybe)
            .build(),
        ExperimentRecord::new(id(3), "Ant-v2"),
    ]
    .into_iter()
    .collect();
    let overview = Monitor::new(store).list_experiments().await.unwrap();

    let classes: Vec<&str> = overview.others.iter().map(|row| row.row_class).collect();
    assert_eq!(classes, ["", "maybe", "success"]);
}

// =============================================================================
// Detail
// =============================================================================

#[tokio::test]
async fn test_detail_navigation() {
    let monitor = abc_monitor();

    let view = monitor.experiment_detail(id(5)).await.unwrap();
    assert_eq!(view.current_id, id(5));
    assert_eq!(view.prev_id, Some(id(3)));
    assert_eq!(view.next_id, Some(id(7)));

    let first = monitor.experiment_detail(id(3)).await.unwrap();
    assert_eq!(first.prev_id, None);
    assert_eq!(first.next_id, Some(id(5)));

    let last = monitor.experiment_detail(id(7)).await.unwrap();
    assert_eq!(last.prev_id, Some(id(5)));
    assert_eq!(last.next_id, None);
}

#[tokio::test]
async fn test_detail_unknown_id() {
    let monitor = abc_monitor();
    assert!(matches!(
        monitor.experiment_detail(id(6)).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_detail_tables_and_artifacts() {
    let store = MemoryExperimentStore::new();
    store.insert(
        ExperimentRecord::builder(id(1), "LunarLander-v2")
            .config_name("discrete")
            .hp("learning_rate", "0.001")
            .hp("horizon", "1024")
            .env_attr("name", "LunarLander-v2")
            .env_attr("max_steps", "1000")
            .iterations(4)
            .max_reward(Some(120.5))
            .build(),
    );
    store.put_artifact(id(1), "reward_plot.svg", b"<svg/>".to_vec()).unwrap();
    store.put_artifact(id(1), "model.png", vec![0x89]).unwrap();

    let view = Monitor::new(store).experiment_detail(id(1)).await.unwrap();
    assert_eq!(view.config_name, "discrete");
    assert_eq!(view.hps[0].key, "learning_rate");
    assert_eq!(view.hps[1].value, "1024");
    assert_eq!(view.env_meta[1].key, "max_steps");
    assert_eq!(view.max_reward_display, "120.50");
    assert_eq!(view.artifacts, ["model.png", "reward_plot.svg"]);
    assert!(view.has_model_diagram);
    assert!(view.has_reward_plot);
    assert!(!view.has_loss_plot);
}

// =============================================================================
// Deletes
// =============================================================================

#[tokio::test]
async fn test_delete_twice() {
    let monitor = abc_monitor();
    monitor.delete(id(5)).await.unwrap();
    assert!(matches!(monitor.delete(id(5)).await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_clear_all_empty_scenario() {
    let monitor = abc_monitor();

    let outcome = monitor.clear_all_empty().await.unwrap();
    assert_eq!(outcome, ClearOutcome { deleted: 2, failed: 0 });

    let overview = monitor.list_experiments().await.unwrap();
    assert_eq!(ids(&overview.others), [5]);

    assert_eq!(monitor.clear_all_empty().await.unwrap().deleted, 0);
}

#[tokio::test]
async fn test_clear_all_short_uses_threshold() {
    let store: MemoryExperimentStore = [run(1, 0), run(2, 9), run(3, 10), run(4, 50)]
        .into_iter()
        .collect();
    let monitor = Monitor::new(store).with_short_threshold(10);

    let outcome = monitor.clear_all_short().await.unwrap();
    assert_eq!(outcome.deleted, 2);

    let remaining = ids(&monitor.list_experiments().await.unwrap().others);
    assert_eq!(remaining, [4, 3]);
}

/// Store whose removal of one id always fails.
struct FlakyStore {
    inner: MemoryExperimentStore,
    broken: ExperimentId,
}

impl ExperimentStore for FlakyStore {
    async fn list(&self) -> Result<Vec<ExperimentRecord>> {
        self.inner.list().await
    }

    async fn get(&self, id: ExperimentId) -> Result<Option<ExperimentRecord>> {
        self.inner.get(id).await
    }

    async fn toggle_bookmark(&self, id: ExperimentId) -> Result<bool> {
        self.inner.toggle_bookmark(id).await
    }

    async fn remove(&self, id: ExperimentId) -> Result<()> {
        if id == self.broken {
            return Err(Error::StorageError("permission denied".into()));
        }
        self.inner.remove(id).await
    }

    async fn artifacts(&self, id: ExperimentId) -> Result<Vec<String>> {
        self.inner.artifacts(id).await
    }

    async fn read_artifact(&self, id: ExperimentId, name: &str) -> Result<Vec<u8>> {
        self.inner.read_artifact(id, name).await
    }
}

#[tokio::test]
async fn test_bulk_delete_counts_failures_and_continues() {
    let store = FlakyStore {
        inner: [run(1, 0), run(2, 0), run(3, 0), run(4, 8)].into_iter().collect(),
        broken: id(2),
    };
    let monitor = Monitor::new(store);

    let outcome = monitor.clear_all_empty().await.unwrap();
    assert_eq!(outcome, ClearOutcome { deleted: 2, failed: 1 });

    let remaining = ids(&monitor.list_experiments().await.unwrap().others);
    assert_eq!(remaining, [4, 2]);
}

// =============================================================================
// Evaluate
// =============================================================================

#[derive(Default)]
struct CountingEvaluator {
    submitted: AtomicUsize,
}

impl Evaluator for CountingEvaluator {
    fn submit(&self, _id: ExperimentId) -> Result<()> {
        self.submitted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_evaluate_hands_off() {
    let evaluator = Arc::new(CountingEvaluator::default());
    let monitor = abc_monitor().with_evaluator(evaluator.clone());

    let ticket = monitor.evaluate(id(5)).await.unwrap();
    assert!(ticket.accepted);
    assert_eq!(ticket.id, id(5));
    assert_eq!(evaluator.submitted.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_evaluate_unknown_id_is_not_submitted() {
    let evaluator = Arc::new(CountingEvaluator::default());
    let monitor = abc_monitor().with_evaluator(evaluator.clone());

    assert!(matches!(monitor.evaluate(id(99)).await, Err(Error::NotFound(_))));
    assert_eq!(evaluator.submitted.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_evaluate_without_evaluator() {
    let monitor = abc_monitor();
    assert!(matches!(
        monitor.evaluate(id(5)).await,
        Err(Error::EvaluationUnavailable(_))
    ));
}

#[tokio::test]
async fn test_concurrent_deletes_one_winner() {
    let monitor = Arc::new(abc_monitor());
    let mut handles = vec![];
    for _ in 0..8 {
        let monitor = Arc::clone(&monitor);
        handles.push(tokio::spawn(async move { monitor.delete(id(5)).await }));
    }

    let mut ok = 0;
    let mut not_found = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => ok += 1,
            Err(Error::NotFound(_)) => not_found += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!((ok, not_found), (1, 7));
}
