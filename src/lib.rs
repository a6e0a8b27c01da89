//! Repscore - Representativeness scoring service
//!
//! Learns how "representative" a feature vector is of a training
//! dataset: pseudo-labels are derived from local density (inverse of
//! average k-nearest-neighbor distance), an ensemble of regression
//! trees is trained on disjoint partitions in parallel, and predictions
//! aggregate the ensemble by averaging.
//!
//! # Modules
//!
//! ## Core pipeline
//! - [`dataset`] - Training matrix validation
//! - [`partition`] - Shuffle-and-split partitioning
//! - [`labeling`] - Distance-density pseudo-labels
//! - [`tree`] - Decision-tree regressor (ensemble member)
//! - [`training`] - Parallel member training
//! - [`ensemble`] - Mean-aggregated prediction
//!
//! ## Lifecycle
//! - [`store`] - Token-keyed ensemble persistence and eviction
//! - [`job`] - Training job state machine and status persistence
//! - [`service`] - Submit/status/predict facade with single-flight
//!   background training
//!
//! ## Services
//! - [`server`] - HTTP server with REST API

// Core error handling
pub mod error;

// Core pipeline
pub mod dataset;
pub mod partition;
pub mod labeling;
pub mod tree;
pub mod training;
pub mod ensemble;

// Lifecycle
pub mod store;
pub mod job;
pub mod service;

// Services
pub mod server;

pub use error::{RepscoreError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{RepscoreError, Result};

    pub use crate::dataset::Dataset;
    pub use crate::ensemble::Ensemble;
    pub use crate::job::{FsStatusStore, JobEvent, JobState, StatusStore};
    pub use crate::service::{Prediction, RepresentativenessService, TrainingSpec};
    pub use crate::store::{EnsembleStore, FsEnsembleStore};
    pub use crate::tree::RegressorTree;
}
