//! Local outlier factor over 1-D absolute distances.
//!
//! LOF(p) = mean(LRD(o) for o in N_k(p)) / LRD(p), where
//! LRD(p) = k / Σ reach_dist(p, o) and
//! reach_dist(p, o) = max(|p − o|, k_distance(o)).
//! Neighbor densities are computed exactly like the point's own.

use vitalstat_core::constants::STD_FLOOR;
use vitalstat_core::errors::DetectionError;

/// Neighbor lists and k-distances for every point.
struct Neighborhoods {
    /// `neighbors[i]` holds the k nearest indices to `i` (self excluded).
    neighbors: Vec<Vec<usize>>,
    /// Distance from `i` to its k-th nearest neighbor.
    k_distance: Vec<f64>,
}

fn neighborhoods(values: &[f64], k: usize) -> Neighborhoods {
    let n = values.len();
    let mut neighbors = Vec::with_capacity(n);
    let mut k_distance = Vec::with_capacity(n);
    for i in 0..n {
        let mut others: Vec<(f64, usize)> = (0..n)
            .filter(|&j| j != i)
            .map(|j| ((values[i] - values[j]).abs(), j))
            .collect();
        // Stable on ties: nearer first, then lower index.
        others.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        others.truncate(k);
        k_distance.push(others.last().map(|(d, _)| *d).unwrap_or(0.0));
        neighbors.push(others.into_iter().map(|(_, j)| j).collect());
    }
    Neighborhoods {
        neighbors,
        k_distance,
    }
}

/// LOF score for every value.
///
/// Requires `0 < k < values.len()`.
pub fn scores(values: &[f64], k: usize) -> Result<Vec<f64>, DetectionError> {
    let n = values.len();
    if n == 0 {
        return Err(DetectionError::InvalidInput(
            "cannot score an empty series".to_string(),
        ));
    }
    if k == 0 || k >= n {
        return Err(DetectionError::InvalidInput(format!(
            "neighbors must satisfy 0 < k < n (k = {k}, n = {n})"
        )));
    }

    let hoods = neighborhoods(values, k);

    let lrd: Vec<f64> = (0..n)
        .map(|i| {
            let reach_sum: f64 = hoods.neighbors[i]
                .iter()
                .map(|&o| (values[i] - values[o]).abs().max(hoods.k_distance[o]))
                .sum();
            k as f64 / reach_sum.max(STD_FLOOR)
        })
        .collect();

    Ok((0..n)
        .map(|i| {
            let neighbor_lrd = hoods.neighbors[i].iter().map(|&o| lrd[o]).sum::<f64>() / k as f64;
            neighbor_lrd / lrd[i]
        })
        .collect())
}
