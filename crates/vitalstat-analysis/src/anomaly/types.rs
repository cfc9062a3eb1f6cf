//! Core types for anomaly detection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use vitalstat_core::constants::{
    SEVERITY_CRITICAL_RATIO, SEVERITY_HIGH_RATIO, SEVERITY_MEDIUM_RATIO,
};

/// Detection method, with its parameters carried inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnomalyMethod {
    /// Z-score against the sample mean and population standard deviation.
    Statistical { threshold: f64 },
    /// Isolation forest; threshold comes from the contamination percentile.
    IsolationForest { num_trees: usize, contamination: f64 },
    /// Local outlier factor over 1-D absolute distances.
    LocalOutlierFactor { neighbors: usize },
    /// Confidence-weighted blend of the listed methods.
    Ensemble { methods: Vec<AnomalyMethod> },
}

impl AnomalyMethod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Statistical { .. } => "statistical",
            Self::IsolationForest { .. } => "isolation_forest",
            Self::LocalOutlierFactor { .. } => "local_outlier_factor",
            Self::Ensemble { .. } => "ensemble",
        }
    }
}

impl Default for AnomalyMethod {
    fn default() -> Self {
        Self::Statistical { threshold: 2.0 }
    }
}

impl fmt::Display for AnomalyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Severity tier, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Classify from `score / threshold`.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= SEVERITY_CRITICAL_RATIO {
            Self::Critical
        } else if ratio >= SEVERITY_HIGH_RATIO {
            Self::High
        } else if ratio >= SEVERITY_MEDIUM_RATIO {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a point was flagged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyContext {
    /// Threshold the score was compared against.
    pub threshold: f64,
    /// `score / threshold`, the input to the severity mapping.
    pub severity_ratio: f64,
    /// Rolling window length, for points emitted by a real-time detector.
    pub window_size: Option<usize>,
}

/// A single flagged sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyPoint {
    /// Index into the original input (or stream position for real-time points).
    pub index: usize,
    pub value: f64,
    pub timestamp: Option<DateTime<Utc>>,
    pub score: f64,
    pub severity: Severity,
    pub context: AnomalyContext,
}

/// A flagged sample across several aligned features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiVariateAnomalyPoint {
    pub index: usize,
    /// One value per feature, in feature order.
    pub values: Vec<f64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub overall_score: f64,
    /// Per-feature contribution, same order as `values`.
    pub feature_scores: Vec<f64>,
    pub severity: Severity,
}

/// Summary fields attached to every detection result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionMetadata {
    pub total_points: usize,
    pub anomaly_count: usize,
    /// `anomaly_count / total_points`.
    pub anomaly_rate: f64,
    /// Set for multivariate results.
    pub feature_count: Option<usize>,
    /// Normalized per-method weights, set for ensemble results.
    pub ensemble_weights: Option<Vec<f64>>,
    /// Raw per-method confidences, set for ensemble results.
    pub method_confidences: Option<Vec<f64>>,
}

impl DetectionMetadata {
    pub fn new(total_points: usize, anomaly_count: usize) -> Self {
        let anomaly_rate = if total_points > 0 {
            anomaly_count as f64 / total_points as f64
        } else {
            0.0
        };
        Self {
            total_points,
            anomaly_count,
            anomaly_rate,
            ..Default::default()
        }
    }
}

/// Result of a univariate (or ensemble) detection call.
///
/// `scores.len()` equals the input length, and `anomalies` holds exactly the
/// indices whose score exceeds `threshold`, in ascending index order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResult {
    pub anomalies: Vec<AnomalyPoint>,
    pub scores: Vec<f64>,
    pub threshold: f64,
    pub method: AnomalyMethod,
    /// Aggregate confidence in [0.0, 1.0].
    pub confidence: f64,
    pub metadata: DetectionMetadata,
}

/// Result of a multivariate detection call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiVariateAnomalyResult {
    pub anomalies: Vec<MultiVariateAnomalyPoint>,
    /// Overall score per sample.
    pub scores: Vec<f64>,
    pub threshold: f64,
    pub method: AnomalyMethod,
    pub confidence: f64,
    pub metadata: DetectionMetadata,
}
