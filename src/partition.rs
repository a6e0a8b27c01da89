//! Dataset partitioning for ensemble diversity
//!
//! Shuffles rows and splits them into disjoint, near-equal partitions,
//! one per ensemble member.

use ndarray::{Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::dataset::Dataset;
use crate::error::{RepscoreError, Result};

/// Shuffle the dataset rows and split them into `n_split` partitions.
///
/// Partitions cover every row exactly once; the first `n % n_split`
/// partitions get one extra row, so sizes differ by at most one.
pub fn split_dataset(data: &Dataset, n_split: usize) -> Result<Vec<Array2<f64>>> {
    let n = data.n_samples();
    if n_split < 1 || n_split > n {
        return Err(RepscoreError::InvalidSplit(format!(
            "n_split must be between 1 and {} (got {})",
            n, n_split
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::from_entropy();
    indices.shuffle(&mut rng);

    let base = n / n_split;
    let remainder = n % n_split;

    let mut partitions = Vec::with_capacity(n_split);
    let mut offset = 0;
    for i in 0..n_split {
        let size = if i < remainder { base + 1 } else { base };
        let rows = &indices[offset..offset + size];
        partitions.push(data.matrix().select(Axis(0), rows));
        offset += size;
    }
    Ok(partitions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(n: usize) -> Dataset {
        let rows: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64, (i * 2) as f64]).collect();
        Dataset::from_rows(&rows).unwrap()
    }

    #[test]
    fn test_sizes_sum_and_balance() {
        for (n, m) in [(20, 4), (10, 3), (7, 7), (5, 1)] {
            let parts = split_dataset(&dataset(n), m).unwrap();
            assert_eq!(parts.len(), m);

            let total: usize = parts.iter().map(|p| p.nrows()).sum();
            assert_eq!(total, n);

            let min = parts.iter().map(|p| p.nrows()).min().unwrap();
            let max = parts.iter().map(|p| p.nrows()).max().unwrap();
            assert!(max - min <= 1, "sizes differ by more than 1: {min}..{max}");
        }
    }

    #[test]
    fn test_union_equals_dataset() {
        let ds = dataset(12);
        let parts = split_dataset(&ds, 3).unwrap();

        // Collect first-column values from every partition; they must be a
        // permutation of the originals.
        let mut seen: Vec<f64> = parts
            .iter()
            .flat_map(|p| p.column(0).to_vec())
            .collect();
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let expected: Vec<f64> = (0..12).map(|i| i as f64).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_invalid_split() {
        let ds = dataset(5);
        assert!(matches!(
            split_dataset(&ds, 0).unwrap_err(),
            RepscoreError::InvalidSplit(_)
        ));
        assert!(matches!(
            split_dataset(&ds, 6).unwrap_err(),
            RepscoreError::InvalidSplit(_)
        ));
    }
}
