//! Error-reporting and performance-metric sinks.
//!
//! The engine calls these around every public operation; it defines no
//! delivery internals. The orchestration layer supplies real sinks, the
//! no-op variants serve standalone use and the in-memory variants serve tests.

use std::error::Error;
use std::sync::Mutex;

/// Receives every failure the engine surfaces, tagged with the operation label.
pub trait ErrorSink: Send + Sync {
    fn report(&self, error: &dyn Error, context: &str);
}

/// Receives elapsed wall time for every public operation.
pub trait MetricsSink: Send + Sync {
    fn record(&self, operation: &str, elapsed_secs: f64);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopErrorSink;

impl ErrorSink for NoopErrorSink {
    fn report(&self, _error: &dyn Error, _context: &str) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn record(&self, _operation: &str, _elapsed_secs: f64) {}
}

/// An error captured by [`InMemoryErrorSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedError {
    pub message: String,
    pub context: String,
}

/// Collects reported errors in memory.
#[derive(Debug, Default)]
pub struct InMemoryErrorSink {
    reports: Mutex<Vec<ReportedError>>,
}

impl InMemoryErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn reports(&self) -> Vec<ReportedError> {
        self.reports
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl ErrorSink for InMemoryErrorSink {
    fn report(&self, error: &dyn Error, context: &str) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push(ReportedError {
                message: error.to_string(),
                context: context.to_string(),
            });
        }
    }
}

/// Collects recorded timings in memory.
#[derive(Debug, Default)]
pub struct InMemoryMetricsSink {
    samples: Mutex<Vec<(String, f64)>>,
}

impl InMemoryMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of `(operation, elapsed_secs)` pairs recorded so far.
    pub fn samples(&self) -> Vec<(String, f64)> {
        self.samples
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Number of samples recorded for `operation`.
    pub fn count(&self, operation: &str) -> usize {
        self.samples()
            .iter()
            .filter(|(op, _)| op == operation)
            .count()
    }
}

impl MetricsSink for InMemoryMetricsSink {
    fn record(&self, operation: &str, elapsed_secs: f64) {
        if let Ok(mut samples) = self.samples.lock() {
            samples.push((operation.to_string(), elapsed_secs));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DetectionError;

    #[test]
    fn test_in_memory_error_sink_records_context() {
        let sink = InMemoryErrorSink::new();
        let err = DetectionError::InvalidInput("empty".into());
        sink.report(&err, "detect_univariate_anomalies");
        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].context, "detect_univariate_anomalies");
        assert!(reports[0].message.contains("empty"));
    }

    #[test]
    fn test_in_memory_metrics_sink_counts_per_operation() {
        let sink = InMemoryMetricsSink::new();
        sink.record("a", 0.1);
        sink.record("b", 0.2);
        sink.record("a", 0.3);
        assert_eq!(sink.count("a"), 2);
        assert_eq!(sink.count("b"), 1);
        assert_eq!(sink.count("c"), 0);
    }

    #[test]
    fn test_noop_sinks_accept_anything() {
        let err = DetectionError::InvalidModel("missing mean".into());
        NoopErrorSink.report(&err, "ctx");
        NoopMetricsSink.record("op", 1.0);
    }
}
