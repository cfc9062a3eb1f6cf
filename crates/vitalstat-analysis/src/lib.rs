//! Vitalstat analysis engine.
//!
//! Anomaly detection (z-score, isolation forest, local outlier factor,
//! multivariate, ensemble, real-time) and correlation analysis (Pearson,
//! Spearman, Kendall with significance tests and confidence intervals) over
//! numeric health time series.

pub mod anomaly;
pub mod correlation;
pub mod stats;

pub use anomaly::{AnomalyDetector, AnomalyMethod, AnomalyResult, RealTimeAnomalyDetector};
pub use correlation::{CorrelationEngine, CorrelationResult, CorrelationType};
