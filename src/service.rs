//! Service facade
//!
//! Ties the partitioner, trainer, stores and job state machine together
//! behind the three operations the API layer consumes: submit training,
//! check status, predict. Training runs in the background on a
//! single-slot execution context; a second submission while the slot is
//! occupied is coalesced into a status report, never a second job.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::dataset::Dataset;
use crate::error::Result;
use crate::job::{JobEvent, JobState, StatusStore};
use crate::partition::split_dataset;
use crate::store::{new_token, EnsembleStore};
use crate::training::train_ensemble;

/// Validated training request
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingSpec {
    pub data: Vec<Vec<f64>>,
    #[serde(default = "default_n_split")]
    pub n_split: usize,
    #[serde(default = "default_n_nearest")]
    pub n_nearest: usize,
}

fn default_n_split() -> usize {
    1
}

fn default_n_nearest() -> usize {
    2
}

/// Prediction outcome: either scores against the production model, or
/// the "no model trained yet" sentinel.
#[derive(Debug)]
pub enum Prediction {
    NoModel,
    Scores { model: String, prediction: Vec<f64> },
}

/// The representativeness scoring service.
///
/// Owns its state handle and store contracts explicitly; persistence is
/// a side effect of every transition, not an ambient global.
pub struct RepresentativenessService {
    state: Mutex<JobState>,
    status_store: Arc<dyn StatusStore>,
    ensemble_store: Arc<dyn EnsembleStore>,
    /// One-permit slot enforcing single-flight training
    slot: Arc<Semaphore>,
}

impl RepresentativenessService {
    /// Load the last recorded job state (persisting the initial record
    /// if none exists) and wire up the stores.
    pub fn new(
        status_store: Arc<dyn StatusStore>,
        ensemble_store: Arc<dyn EnsembleStore>,
    ) -> Result<Self> {
        let state = match status_store.load()? {
            Some(state) => state,
            None => {
                let state = JobState::default();
                status_store.save(&state)?;
                state
            }
        };
        Ok(Self {
            state: Mutex::new(state),
            status_store,
            ensemble_store,
            slot: Arc::new(Semaphore::new(1)),
        })
    }

    /// Submit a training request. Returns immediately with the current
    /// job state; training itself proceeds in the background.
    ///
    /// Admission happens at the scheduling layer: if the single slot is
    /// occupied the submission becomes an `InProgress` self-transition
    /// and no second job starts.
    pub fn submit_training(self: &Arc<Self>, spec: TrainingSpec) -> Result<JobState> {
        match Arc::clone(&self.slot).try_acquire_owned() {
            Ok(permit) => {
                let snapshot = {
                    let mut state = self.state.lock();
                    self.apply_transition(&mut state, JobEvent::Started)?;
                    state.clone()
                };
                let service = Arc::clone(self);
                tokio::task::spawn_blocking(move || {
                    service.run_training_job(spec);
                    // The slot is released only after the terminal
                    // transition has been applied, so a racing
                    // submission can never interleave with it.
                    drop(permit);
                });
                Ok(snapshot)
            }
            Err(_) => self.coalesced_status(),
        }
    }

    /// Current job state. While a job is running this refreshes the
    /// record with an `InProgress` self-transition.
    pub fn status(&self) -> Result<JobState> {
        self.coalesced_status()
    }

    /// Score a batch of input vectors against the production ensemble.
    /// Lazy-loads the ensemble on first use after process start.
    pub fn predict(&self, inputs: &[Vec<f64>]) -> Result<Prediction> {
        let token = self.state.lock().prod_model.clone();
        let Some(token) = token else {
            return Ok(Prediction::NoModel);
        };
        let ensemble = self.ensemble_store.load(&token)?;
        let prediction = ensemble.predict_batch(inputs)?;
        Ok(Prediction::Scores {
            model: token,
            prediction,
        })
    }

    /// Report the current state, refreshing it with `InProgress` only
    /// while a job really is running. The check and the transition
    /// share one critical section, so a terminal transition can never
    /// be overwritten by a late status poll.
    fn coalesced_status(&self) -> Result<JobState> {
        let mut state = self.state.lock();
        if state.in_progress {
            self.apply_transition(&mut state, JobEvent::InProgress)?;
        }
        Ok(state.clone())
    }

    /// The background job body. Failures are recorded in the job state
    /// and never propagate past the submission boundary.
    fn run_training_job(&self, spec: TrainingSpec) {
        let event = match self.train(&spec) {
            Ok(token) => JobEvent::Ended { token },
            Err(err) => {
                error!(error = %err, "Training failed");
                JobEvent::Failed {
                    error: err.to_string(),
                }
            }
        };
        let mut state = self.state.lock();
        if let Err(err) = self.apply_transition(&mut state, event) {
            error!(error = %err, "Failed to record training outcome");
        }
    }

    fn train(&self, spec: &TrainingSpec) -> Result<String> {
        info!("Starting new ensemble model training");
        let dataset = Dataset::from_rows(&spec.data)?;
        let partitions = split_dataset(&dataset, spec.n_split)?;
        let token = new_token();
        info!(token, "New ensemble model token");
        train_ensemble(
            self.ensemble_store.as_ref(),
            &token,
            &partitions,
            spec.n_nearest,
        )?;
        Ok(token)
    }

    /// Apply one transition under the state lock: mutate, persist the
    /// whole record, then sweep superseded ensembles.
    ///
    /// Eviction runs on `Started`, `Ended` and `Failed`, where keeping
    /// `prod_model` alone is correct (`Started` fires before the new
    /// token exists; `Ended` has already promoted it; `Failed` discards
    /// it). The `InProgress` self-transition skips the sweep — it fires
    /// while an in-flight token's partial ensemble is on disk and must
    /// not delete it.
    fn apply_transition(&self, state: &mut JobState, event: JobEvent) -> Result<()> {
        state.apply(&event);
        self.status_store.save(state)?;

        if !matches!(event, JobEvent::InProgress) {
            if let Err(err) = self.ensemble_store.evict(state.prod_model.as_deref()) {
                error!(error = %err, "Ensemble eviction failed");
            }
        }
        Ok(())
    }
}
