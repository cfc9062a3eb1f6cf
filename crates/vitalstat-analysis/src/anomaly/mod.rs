//! Anomaly detection: z-score, isolation forest, local outlier factor,
//! multivariate scoring, confidence-weighted ensembles and a sliding-window
//! real-time detector.

pub mod detector;
pub mod ensemble;
pub mod isolation;
pub mod lof;
pub mod multivariate;
pub mod realtime;
pub mod threshold;
pub mod types;
pub mod zscore;

pub use detector::AnomalyDetector;
pub use isolation::{ForestParams, IsolationForest, IsolationTree};
pub use realtime::{RealTimeAnomalyDetector, TrainedModel};
pub use threshold::ThresholdPolicy;
pub use types::{
    AnomalyContext, AnomalyMethod, AnomalyPoint, AnomalyResult, DetectionMetadata,
    MultiVariateAnomalyPoint, MultiVariateAnomalyResult, Severity,
};
