//! # Experiment Monitor: dashboard for ML training experiments
//!
//! Lists the experiments a training pipeline has produced, shows each one's
//! hyperparameters, environment and plots, and lets the user bookmark,
//! delete, prune and re-evaluate them.
//!
//! ## Layers
//!
//! - [`experiment`]: records and the [`ExperimentStore`](experiment::ExperimentStore)
//!   registry interface (in-memory and on-disk backends)
//! - [`monitor`]: listing, detail and mutation services over a store
//! - [`evaluate`]: hand-off of evaluation requests to an external collaborator
//! - [`web`]: axum routes and Handlebars pages
//! - [`config`]: layered configuration
//!
//! ## Example Usage
//!
//! ```rust
//! use experiment_monitor::experiment::{ExperimentId, ExperimentRecord, MemoryExperimentStore};
//! use experiment_monitor::monitor::Monitor;
//!
//! # async fn example() -> experiment_monitor::Result<()> {
//! let store: MemoryExperimentStore = [3, 5, 7]
//!     .into_iter()
//!     .map(|id| ExperimentRecord::new(ExperimentId::new(id), "CartPole-v1"))
//!     .collect();
//! let monitor = Monitor::new(store);
//!
//! let view = monitor.experiment_detail(ExperimentId::new(5)).await?;
//! assert_eq!(view.prev_id, Some(ExperimentId::new(3)));
//! assert_eq!(view.next_id, Some(ExperimentId::new(7)));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod error;
pub mod evaluate;
pub mod experiment;
pub mod monitor;
pub mod web;

pub use error::{Error, Result};
