//! Distance-density pseudo-labels
//!
//! Each row's label is derived from its local density: the inverse of
//! one plus the average Euclidean distance to its k nearest neighbors
//! (self-match excluded). Labels are always in (0, 1].

use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{RepscoreError, Result};

/// Max-heap entry for partial sort (keeps the k smallest distances)
#[derive(PartialEq)]
struct Dist(f64);

impl Eq for Dist {}
impl PartialOrd for Dist {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}
impl Ord for Dist {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }
}

/// Compute density-derived pseudo-labels for every row of `x`.
///
/// Fails with `InsufficientData` when `k` exceeds the number of rows.
/// When `k == n`, only `n - 1` neighbors exist after excluding the row
/// itself; the average is taken over those.
pub fn density_labels(x: &Array2<f64>, k: usize) -> Result<Array1<f64>> {
    let n = x.nrows();
    if k > n {
        return Err(RepscoreError::InsufficientData);
    }
    let effective_k = k.min(n.saturating_sub(1));
    if effective_k == 0 {
        // Single-row partition: no neighbors, density collapses to 1.
        return Ok(Array1::ones(n));
    }

    let labels: Vec<f64> = (0..n)
        .into_par_iter()
        .map(|i| {
            let avg = mean_knn_distance(x, i, effective_k);
            1.0 / (1.0 + avg)
        })
        .collect();

    Ok(Array1::from_vec(labels))
}

/// Average distance from row `i` to its k nearest neighbors, excluding
/// itself. Uses a max-heap partial sort — O(n log k) per row.
fn mean_knn_distance(x: &Array2<f64>, i: usize, k: usize) -> f64 {
    let point = x.row(i);
    let mut heap = BinaryHeap::with_capacity(k + 1);

    for (j, row) in x.rows().into_iter().enumerate() {
        if j == i {
            continue;
        }
        let dist = euclidean(point, row);
        if heap.len() < k {
            heap.push(Dist(dist));
        } else if let Some(top) = heap.peek() {
            if dist < top.0 {
                heap.pop();
                heap.push(Dist(dist));
            }
        }
    }

    let count = heap.len();
    heap.into_iter().map(|d| d.0).sum::<f64>() / count as f64
}

fn euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(ai, bi)| {
            let d = ai - bi;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}
