//! Anomaly detection configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the anomaly detection subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Z-score threshold for the statistical method. Default: 2.0.
    pub zscore_threshold: Option<f64>,
    /// Number of isolation trees. Default: 100.
    pub num_trees: Option<usize>,
    /// Expected anomaly fraction for isolation forests. Default: 0.1.
    pub contamination: Option<f64>,
    /// Upper bound on the per-tree subsample size. Default: 256.
    pub max_samples: Option<usize>,
    /// Neighbor count for local outlier factor. Default: 20.
    pub lof_neighbors: Option<usize>,
    /// LOF values above this are flagged. Default: 1.5.
    pub lof_threshold: Option<f64>,
    /// Rolling window size for real-time detectors. Default: 50.
    pub window_size: Option<usize>,
    /// RNG seed for reproducible forests. Default: none (entropy).
    pub seed: Option<u64>,
    /// Build isolation trees on the rayon pool. Default: true.
    pub parallel: Option<bool>,
}

impl AnomalyConfig {
    pub fn effective_zscore_threshold(&self) -> f64 {
        self.zscore_threshold.unwrap_or(2.0)
    }

    pub fn effective_num_trees(&self) -> usize {
        self.num_trees.unwrap_or(100)
    }

    pub fn effective_contamination(&self) -> f64 {
        self.contamination.unwrap_or(0.1)
    }

    pub fn effective_max_samples(&self) -> usize {
        self.max_samples
            .unwrap_or(crate::constants::MAX_ISOLATION_SAMPLES)
    }

    pub fn effective_lof_neighbors(&self) -> usize {
        self.lof_neighbors.unwrap_or(20)
    }

    pub fn effective_lof_threshold(&self) -> f64 {
        self.lof_threshold.unwrap_or(1.5)
    }

    pub fn effective_window_size(&self) -> usize {
        self.window_size.unwrap_or(50)
    }

    pub fn effective_parallel(&self) -> bool {
        self.parallel.unwrap_or(true)
    }
}
