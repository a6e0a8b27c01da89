//! Ensemble aggregation
//!
//! An ensemble is an ordered set of fitted regression trees sharing one
//! feature-count contract; its prediction is the mean of the members'.

use rayon::prelude::*;
use tracing::debug;

use crate::error::{RepscoreError, Result};
use crate::tree::RegressorTree;

/// An immutable collection of fitted ensemble members.
#[derive(Debug, Clone)]
pub struct Ensemble {
    members: Vec<RegressorTree>,
    n_features: usize,
}

impl Ensemble {
    /// Build an ensemble from fitted members. Returns `None` when the
    /// member list is empty; the feature contract comes from the first
    /// member.
    pub fn from_members(members: Vec<RegressorTree>) -> Option<Self> {
        let n_features = members.first()?.n_features();
        Some(Self { members, n_features })
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Feature count every input vector must match
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Score a batch of input vectors.
    ///
    /// Validation is all-or-nothing: if any vector has the wrong length
    /// or a non-finite element, the whole batch is rejected with
    /// `InvalidInput` carrying the expected feature count. Output order
    /// matches input order.
    pub fn predict_batch(&self, inputs: &[Vec<f64>]) -> Result<Vec<f64>> {
        let expected = self.n_features;
        let all_valid = inputs
            .iter()
            .all(|v| v.len() == expected && v.iter().all(|x| x.is_finite()));
        if !all_valid {
            return Err(RepscoreError::InvalidInput { expected });
        }

        inputs
            .par_iter()
            .map(|input| self.predict_one(input))
            .collect()
    }

    /// Mean of member predictions for a single validated vector
    fn predict_one(&self, input: &[f64]) -> Result<f64> {
        let mut sum = 0.0;
        for (idx, member) in self.members.iter().enumerate() {
            let pred = member.predict_one(input)?;
            debug!(member = idx, prediction = pred, "Member prediction");
            sum += pred;
        }
        Ok(sum / self.members.len() as f64)
    }
}
