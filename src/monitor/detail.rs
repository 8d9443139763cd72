//! Detail page model for a single experiment

use serde::Serialize;
use serde_json::{Map, Value};

use super::listing::{format_iterations, format_reward};
use super::Monitor;
use crate::experiment::{ExperimentId, ExperimentStore, SuccessClass};
use crate::{Error, Result};

/// Model diagram embedded on the detail page when present.
pub const MODEL_DIAGRAM: &str = "model.png";
/// Reward/episode-length plot embedded when present.
pub const REWARD_PLOT: &str = "reward_plot.svg";
/// Loss/entropy plot embedded when present.
pub const LOSS_PLOT: &str = "loss_plot.svg";

/// One row of a key/value table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Parameter or attribute name.
    pub key: String,
    /// Display value; strings verbatim, anything else as JSON text.
    pub value: String,
}

impl Entry {
    fn table(map: &Map<String, Value>) -> Vec<Self> {
        map.iter()
            .map(|(key, value)| Self {
                key: key.clone(),
                value: match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
            })
            .collect()
    }
}

/// Everything the detail page shows about one experiment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentView {
    /// Id of the experiment shown.
    pub current_id: ExperimentId,
    /// Next-lower id in the registry.
    pub prev_id: Option<ExperimentId>,
    /// Next-higher id in the registry.
    pub next_id: Option<ExperimentId>,
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
    /// `iterations` formatted for display.
    pub iterations_display: String,
    /// Best observed reward.
    pub max_reward: Option<f64>,
    /// `max_reward` formatted for display.
    pub max_reward_display: String,
    /// Bookmark flag.
    pub bookmark: bool,
    /// Upstream success classification.
    pub success: SuccessClass,
    /// Hyperparameters in recorded order.
    pub hps: Vec<Entry>,
    /// Environment attributes in recorded order.
    pub env_meta: Vec<Entry>,
    /// Names of all files stored with the experiment.
    pub artifacts: Vec<String>,
    /// Whether `model.png` is available.
    pub has_model_diagram: bool,
    /// Whether `reward_plot.svg` is available.
    pub has_reward_plot: bool,
    /// Whether `loss_plot.svg` is available.
    pub has_loss_plot: bool,
}

/// Neighbours of `id` in an ascending id list: next-lower and next-higher.
///
/// `id` itself does not need to be in the list.
#[must_use]
pub fn neighbours(
    sorted_ids: &[ExperimentId],
    id: ExperimentId,
) -> (Option<ExperimentId>, Option<ExperimentId>) {
    let below = sorted_ids.partition_point(|&other| other < id);
    let above = sorted_ids.partition_point(|&other| other <= id);
    let prev = below.checked_sub(1).map(|i| sorted_ids[i]);
    let next = sorted_ids.get(above).copied();
    (prev, next)
}

impl<S: ExperimentStore> Monitor<S> {
    /// Detail view of one experiment with prev/next navigation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id; propagates store failures.
    pub async fn experiment_detail(&self, id: ExperimentId) -> Result<ExperimentView> {
        let record = self.store.get(id).await?.ok_or(Error::NotFound(id))?;

        let mut ids = self.store.ids().await?;
        ids.sort_unstable();
        let (prev_id, next_id) = neighbours(&ids, id);

        let artifacts = self.store.artifacts(id).await?;
        let has = |name: &str| artifacts.iter().any(|a| a == name);

        Ok(ExperimentView {
            current_id: record.id(),
            prev_id,
            next_id,
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
            hps: Entry::table(record.hps()),
            env_meta: Entry::table(record.env_meta()),
            has_model_diagram: has(MODEL_DIAGRAM),
            has_reward_plot: has(REWARD_PLOT),
            has_loss_plot: has(LOSS_PLOT),
            artifacts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(raw: &[u64]) -> Vec<ExperimentId> {
        raw.iter().copied().map(ExperimentId::new).collect()
    }

    #[test]
    fn test_neighbours_middle() {
        let sorted = ids(&[3, 5, 7]);
        assert_eq!(
            neighbours(&sorted, ExperimentId::new(5)),
            (Some(ExperimentId::new(3)), Some(ExperimentId::new(7)))
        );
    }

    #[test]
    fn test_neighbours_edges() {
        let sorted = ids(&[3, 5, 7]);
        assert_eq!(neighbours(&sorted, ExperimentId::new(3)).0, None);
        assert_eq!(neighbours(&sorted, ExperimentId::new(7)).1, None);
        assert_eq!(neighbours(&ids(&[4]), ExperimentId::new(4)), (None, None));
    }

    #[test]
    fn test_neighbours_of_absent_id() {
        let sorted = ids(&[3, 7]);
        assert_eq!(
            neighbours(&sorted, ExperimentId::new(5)),
            (Some(ExperimentId::new(3)), Some(ExperimentId::new(7)))
        );
    }

    #[test]
    fn test_entry_table_renders_values() {
        let map = json!({"workers": "8", "clip": 0.2, "recurrent": true});
        let entries = Entry::table(map.as_object().unwrap());
        assert_eq!(entries[0].value, "8");
        assert_eq!(entries[1].value, "0.2");
        assert_eq!(entries[2].value, "true");
    }
}
