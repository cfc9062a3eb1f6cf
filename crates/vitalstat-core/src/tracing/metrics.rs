//! Operation names for Vitalstat metrics.
//!
//! Detection and correlation spans and the injected metrics/error sinks use
//! these labels so log queries and recorded timings agree on naming.

// Operation labels reported to the metrics and error sinks.
pub const OP_DETECT_UNIVARIATE: &str = "detect_univariate_anomalies";
pub const OP_DETECT_MULTIVARIATE: &str = "detect_multivariate_anomalies";
pub const OP_DETECT_ENSEMBLE: &str = "detect_ensemble_anomalies";
pub const OP_CREATE_REALTIME: &str = "create_realtime_detector";
pub const OP_UPDATE_REALTIME: &str = "update_realtime_detector";
pub const OP_CORRELATION: &str = "calculate_correlation";
pub const OP_CORRELATION_MATRIX: &str = "calculate_correlation_matrix";
