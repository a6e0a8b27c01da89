//! Ensemble member training
//!
//! One regression tree per partition, fitted against density-derived
//! pseudo-labels and persisted as soon as it is ready. Partitions train
//! in parallel and share no mutable state.

use ndarray::Array2;
use rayon::prelude::*;
use tracing::info;

use crate::ensemble::Ensemble;
use crate::error::{RepscoreError, Result};
use crate::labeling::density_labels;
use crate::store::EnsembleStore;
use crate::tree::RegressorTree;

/// Train one member per partition and assemble the result.
///
/// The insufficient-data check runs across ALL partitions before any
/// parallel work is dispatched, so a doomed job never persists a
/// partial ensemble member.
pub fn train_ensemble(
    store: &dyn EnsembleStore,
    token: &str,
    partitions: &[Array2<f64>],
    n_nearest: usize,
) -> Result<Ensemble> {
    if partitions.iter().any(|p| n_nearest > p.nrows()) {
        return Err(RepscoreError::InsufficientData);
    }

    let members: Vec<RegressorTree> = partitions
        .par_iter()
        .enumerate()
        .map(|(idx, partition)| train_member(store, token, idx, partition, n_nearest))
        .collect::<Result<_>>()?;

    info!(token, members = members.len(), "Ensemble model training finished");
    Ensemble::from_members(members).ok_or_else(|| RepscoreError::EmptyEnsemble(token.to_string()))
}

/// Fit a single member on its partition and persist it immediately, so
/// partial ensembles are observable if the process dies mid-training.
fn train_member(
    store: &dyn EnsembleStore,
    token: &str,
    idx: usize,
    x: &Array2<f64>,
    n_nearest: usize,
) -> Result<RegressorTree> {
    let y = density_labels(x, n_nearest)?;
    let mut tree = RegressorTree::new();
    tree.fit(x, &y)?;
    store.persist(token, idx, &tree)?;
    info!(token, member = idx, rows = x.nrows(), "New model trained");
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FsEnsembleStore;
    use ndarray::Array2;
    use rand::Rng;
    use tempfile::TempDir;

    fn random_partitions(sizes: &[usize], n_features: usize) -> Vec<Array2<f64>> {
        let mut rng = rand::thread_rng();
        sizes
            .iter()
            .map(|&n| {
                let data: Vec<f64> = (0..n * n_features).map(|_| rng.gen::<f64>()).collect();
                Array2::from_shape_vec((n, n_features), data).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_trains_one_member_per_partition() {
        let dir = TempDir::new().unwrap();
        let store = FsEnsembleStore::new(dir.path()).unwrap();
        let partitions = random_partitions(&[5, 5, 5, 5], 3);

        let ensemble = train_ensemble(&store, "tok", &partitions, 3).unwrap();
        assert_eq!(ensemble.len(), 4);
        assert_eq!(ensemble.n_features(), 3);

        // Every member persisted under the token.
        for idx in 0..4 {
            assert!(dir.path().join("tok").join(format!("model_{idx}.json")).exists());
        }
    }

    #[test]
    fn test_insufficient_data_aborts_before_any_persist() {
        let dir = TempDir::new().unwrap();
        let store = FsEnsembleStore::new(dir.path()).unwrap();
        // Second partition is too small for k = 4.
        let partitions = random_partitions(&[6, 3], 2);

        let err = train_ensemble(&store, "tok", &partitions, 4).unwrap_err();
        assert!(matches!(err, RepscoreError::InsufficientData));
        assert!(!dir.path().join("tok").exists(), "no member may be persisted");
    }

    #[test]
    fn test_trained_ensemble_predicts_in_unit_range() {
        let dir = TempDir::new().unwrap();
        let store = FsEnsembleStore::new(dir.path()).unwrap();
        let partitions = random_partitions(&[10, 10], 2);

        let ensemble = train_ensemble(&store, "tok", &partitions, 2).unwrap();
        let scores = ensemble.predict_batch(&[vec![0.5, 0.5]]).unwrap();
        assert!(scores[0] > 0.0 && scores[0] <= 1.0, "score {} out of range", scores[0]);
    }
}
