//! Training dataset validation
//!
//! Raw caller input (`Vec<Vec<f64>>`) is validated once here; every
//! downstream component can then assume a rectangular, finite matrix.

use ndarray::Array2;

use crate::error::{RepscoreError, Result};

/// Validated numeric training matrix. Rows are samples, columns features.
#[derive(Debug, Clone)]
pub struct Dataset {
    matrix: Array2<f64>,
}

impl Dataset {
    /// Build a dataset from caller-supplied rows.
    ///
    /// Fails with the training-error category matching the defect:
    /// empty input, ragged rows, or non-finite values.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        if rows.is_empty() {
            return Err(RepscoreError::EmptyDataset);
        }
        let n_features = rows[0].len();
        if n_features == 0 {
            return Err(RepscoreError::EmptyDataset);
        }
        if rows.iter().any(|r| r.len() != n_features) {
            return Err(RepscoreError::ShapeMismatch);
        }
        if rows.iter().any(|r| r.iter().any(|v| !v.is_finite())) {
            return Err(RepscoreError::NonNumericData);
        }

        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        let matrix = Array2::from_shape_vec((rows.len(), n_features), flat)
            .map_err(|_| RepscoreError::ShapeMismatch)?;
        Ok(Self { matrix })
    }

    pub fn n_samples(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }
}
