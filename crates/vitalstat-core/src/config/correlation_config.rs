//! Correlation configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the correlation subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CorrelationConfig {
    /// p-values below this are significant. Default: 0.05.
    pub significance_level: Option<f64>,
    /// Confidence level for Fisher intervals. Default: 0.95.
    pub confidence_level: Option<f64>,
    /// Build matrix pairs on the rayon pool. Default: true.
    pub parallel: Option<bool>,
}

impl CorrelationConfig {
    pub fn effective_significance_level(&self) -> f64 {
        self.significance_level.unwrap_or(0.05)
    }

    pub fn effective_confidence_level(&self) -> f64 {
        self.confidence_level.unwrap_or(0.95)
    }

    pub fn effective_parallel(&self) -> bool {
        self.parallel.unwrap_or(true)
    }
}
