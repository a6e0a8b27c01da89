//! Error types for the representativeness scoring service
//!
//! Training-time data errors carry the exact human-readable category
//! reported to callers through the job status, so `Display` output is
//! part of the service contract.

use thiserror::Error;

/// Result type alias for repscore operations
pub type Result<T> = std::result::Result<T, RepscoreError>;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum RepscoreError {
    /// A partition is smaller than the requested neighbor count.
    #[error("Provided data and parameters require lower 'n_nearest'")]
    InsufficientData,

    /// Split count outside the valid 1..=n_samples range.
    #[error("Invalid split count: {0}")]
    InvalidSplit(String),

    /// Prediction input failed shape or numeric validation.
    #[error("Invalid input (objects should be represented by {expected}-number arrays)")]
    InvalidInput { expected: usize },

    /// No persisted ensemble under the given token. Store corruption,
    /// not user error.
    #[error("Ensemble model not found")]
    EnsembleNotFound(String),

    /// Token directory exists but holds zero members.
    #[error("Empty ensemble model {0}")]
    EmptyEnsemble(String),

    #[error("Provided data could not be converted to numeric format")]
    NonNumericData,

    #[error("Shapes or formats of provided data are incompatible")]
    ShapeMismatch,

    #[error("No data provided")]
    EmptyDataset,

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RepscoreError::InvalidInput { expected: 3 };
        assert_eq!(
            err.to_string(),
            "Invalid input (objects should be represented by 3-number arrays)"
        );
    }

    #[test]
    fn test_training_error_categories() {
        assert_eq!(
            RepscoreError::NonNumericData.to_string(),
            "Provided data could not be converted to numeric format"
        );
        assert_eq!(RepscoreError::EmptyDataset.to_string(), "No data provided");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: RepscoreError = io_err.into();
        assert!(matches!(err, RepscoreError::Io(_)));
    }
}
