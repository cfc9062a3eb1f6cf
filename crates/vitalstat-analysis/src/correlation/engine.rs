//! CorrelationEngine: pairwise coefficients with significance, and the
//! matrix builder on top of them.

use std::sync::Arc;
use std::time::Instant;

use vitalstat_core::config::CorrelationConfig;
use vitalstat_core::constants::MIN_CORRELATION_SAMPLES;
use vitalstat_core::errors::CorrelationError;
use vitalstat_core::tracing::metrics;
use vitalstat_core::traits::{ErrorSink, MetricsSink, NoopErrorSink, NoopMetricsSink};

use super::coefficients;
use super::matrix;
use super::significance;
use super::types::{CorrelationResult, CorrelationType, MultiVariateCorrelation};

/// Stateless correlation calculator.
pub struct CorrelationEngine {
    config: CorrelationConfig,
    error_sink: Arc<dyn ErrorSink>,
    metrics_sink: Arc<dyn MetricsSink>,
}

impl CorrelationEngine {
    pub fn new(config: CorrelationConfig) -> Self {
        Self {
            config,
            error_sink: Arc::new(NoopErrorSink),
            metrics_sink: Arc::new(NoopMetricsSink),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(CorrelationConfig::default())
    }

    pub fn with_sinks(
        mut self,
        error_sink: Arc<dyn ErrorSink>,
        metrics_sink: Arc<dyn MetricsSink>,
    ) -> Self {
        self.error_sink = error_sink;
        self.metrics_sink = metrics_sink;
        self
    }

    pub fn config(&self) -> &CorrelationConfig {
        &self.config
    }

    /// Coefficient, p-value and interval for one pair of series.
    ///
    /// Pairs where either value is non-finite are dropped before the
    /// minimum-sample check.
    pub fn calculate_correlation(
        &self,
        var1: &[f64],
        var2: &[f64],
        correlation_type: CorrelationType,
    ) -> Result<CorrelationResult, CorrelationError> {
        self.instrumented(metrics::OP_CORRELATION, var1.len(), || {
            self.pair(var1, var2, correlation_type)
        })
    }

    /// Symmetric coefficient, significance and p-value matrices.
    pub fn calculate_correlation_matrix(
        &self,
        variables: &[Vec<f64>],
        names: &[String],
        correlation_type: CorrelationType,
    ) -> Result<MultiVariateCorrelation, CorrelationError> {
        self.instrumented(metrics::OP_CORRELATION_MATRIX, variables.len(), || {
            matrix::build(variables, names, self.config.effective_parallel(), |x, y| {
                self.pair(x, y, correlation_type)
            })
        })
    }

    fn instrumented<T>(
        &self,
        operation: &'static str,
        sample_count: usize,
        f: impl FnOnce() -> Result<T, CorrelationError>,
    ) -> Result<T, CorrelationError> {
        let span = tracing::debug_span!("correlation", operation, sample_count);
        let _guard = span.enter();
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();
        self.metrics_sink.record(operation, elapsed.as_secs_f64());
        match &result {
            Ok(_) => tracing::debug!(
                correlation_time_ms = elapsed.as_millis() as u64,
                "correlation complete"
            ),
            Err(e) => {
                tracing::warn!(error = %e, "correlation failed");
                self.error_sink.report(e, operation);
            }
        }
        result
    }

    fn pair(
        &self,
        var1: &[f64],
        var2: &[f64],
        correlation_type: CorrelationType,
    ) -> Result<CorrelationResult, CorrelationError> {
        if var1.len() != var2.len() {
            return Err(CorrelationError::InvalidInput(format!(
                "series lengths differ: {} vs {}",
                var1.len(),
                var2.len()
            )));
        }

        let (x, y): (Vec<f64>, Vec<f64>) = var1
            .iter()
            .zip(var2)
            .filter(|(a, b)| a.is_finite() && b.is_finite())
            .map(|(&a, &b)| (a, b))
            .unzip();
        let n = x.len();
        if n < MIN_CORRELATION_SAMPLES {
            return Err(CorrelationError::InsufficientData {
                required: MIN_CORRELATION_SAMPLES,
                actual: n,
            });
        }

        let coefficient = match correlation_type {
            CorrelationType::Pearson => coefficients::pearson(&x, &y),
            CorrelationType::Spearman => coefficients::spearman(&x, &y),
            CorrelationType::Kendall => coefficients::kendall(&x, &y),
        };
        let p_value = significance::p_value(coefficient, n, correlation_type);
        let confidence_interval =
            significance::fisher_interval(coefficient, n, self.config.effective_confidence_level());

        Ok(CorrelationResult {
            coefficient,
            p_value,
            confidence_interval,
            sample_size: n,
            is_significant: p_value < self.config.effective_significance_level(),
            correlation_type,
        })
    }
}

impl Default for CorrelationEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}
