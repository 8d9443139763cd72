//! Experiment registry
//!
//! Records describing training runs, and the [`ExperimentStore`] interface
//! the monitor services read and mutate them through.
//!
//! ## Backends
//!
//! ```text
//! ExperimentStore (trait)
//!   ├── MemoryExperimentStore     DashMap, tests and embedding
//!   └── DirectoryExperimentStore  <root>/<id>/meta.json + progress.json + artifacts
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use experiment_monitor::experiment::{
//!     ExperimentId, ExperimentRecord, MemoryExperimentStore, SuccessClass, TrainingProgress,
//! };
//!
//! let progress = TrainingProgress::new(vec![12.0, 48.5, 200.0]);
//! let record = ExperimentRecord::builder(ExperimentId::new(1_588_341_681), "CartPole-v1")
//!     .hp("learning_rate", "0.001")
//!     .progress(&progress)
//!     .success(SuccessClass::Success)
//!     .build();
//!
//! let store = MemoryExperimentStore::new();
//! store.insert(record);
//! assert_eq!(store.len(), 1);
//! ```

mod directory;
mod experiment_record;
mod id;
mod memory;
mod progress;
mod store;
mod success;

pub use directory::{
    parse_dir_name, record_from_meta, DirectoryExperimentStore, META_FILE, PROGRESS_FILE,
};
pub use experiment_record::{ExperimentRecord, ExperimentRecordBuilder, DEFAULT_CONFIG_NAME};
pub use id::ExperimentId;
pub use memory::MemoryExperimentStore;
pub use progress::TrainingProgress;
pub use store::{validate_artifact_name, ExperimentStore};
pub use success::SuccessClass;
