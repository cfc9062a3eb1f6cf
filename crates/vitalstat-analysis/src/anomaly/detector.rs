//! Top-level AnomalyDetector: dispatches a method to its scorer, resolves
//! the threshold, extracts flagged points, and reports timings and failures
//! to the injected sinks.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

use vitalstat_core::config::AnomalyConfig;
use vitalstat_core::errors::DetectionError;
use vitalstat_core::tracing::metrics;
use vitalstat_core::traits::{ErrorSink, MetricsSink, NoopErrorSink, NoopMetricsSink};

use super::ensemble;
use super::isolation::{self, ForestParams, IsolationForest};
use super::lof;
use super::multivariate::{self, MultivariateScores};
use super::realtime::RealTimeAnomalyDetector;
use super::threshold::{self, ThresholdPolicy};
use super::types::{
    AnomalyMethod, AnomalyPoint, AnomalyResult, DetectionMetadata, MultiVariateAnomalyPoint,
    MultiVariateAnomalyResult,
};
use super::zscore;

/// Anomaly detection entry point for the orchestration layer.
///
/// Stateless between calls apart from configuration; every call with the
/// same input and a configured seed produces the same result.
pub struct AnomalyDetector {
    config: AnomalyConfig,
    error_sink: Arc<dyn ErrorSink>,
    metrics_sink: Arc<dyn MetricsSink>,
}

impl AnomalyDetector {
    /// Create a detector with no-op sinks.
    pub fn new(config: AnomalyConfig) -> Self {
        Self {
            config,
            error_sink: Arc::new(NoopErrorSink),
            metrics_sink: Arc::new(NoopMetricsSink),
        }
    }

    /// Create a detector with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(AnomalyConfig::default())
    }

    /// Attach the error-reporting and performance-metric sinks.
    pub fn with_sinks(
        mut self,
        error_sink: Arc<dyn ErrorSink>,
        metrics_sink: Arc<dyn MetricsSink>,
    ) -> Self {
        self.error_sink = error_sink;
        self.metrics_sink = metrics_sink;
        self
    }

    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    /// Statistical method with the configured threshold.
    pub fn statistical_method(&self) -> AnomalyMethod {
        AnomalyMethod::Statistical {
            threshold: self.config.effective_zscore_threshold(),
        }
    }

    /// Isolation forest method with the configured tree count and contamination.
    pub fn isolation_forest_method(&self) -> AnomalyMethod {
        AnomalyMethod::IsolationForest {
            num_trees: self.config.effective_num_trees(),
            contamination: self.config.effective_contamination(),
        }
    }

    /// LOF method with the configured neighbor count.
    pub fn lof_method(&self) -> AnomalyMethod {
        AnomalyMethod::LocalOutlierFactor {
            neighbors: self.config.effective_lof_neighbors(),
        }
    }

    /// Score a single series and flag the points above threshold.
    pub fn detect_univariate_anomalies(
        &self,
        data: &[f64],
        timestamps: Option<&[DateTime<Utc>]>,
        method: &AnomalyMethod,
    ) -> Result<AnomalyResult, DetectionError> {
        self.instrumented(metrics::OP_DETECT_UNIVARIATE, data.len(), || {
            self.univariate(data, timestamps, method)
        })
    }

    /// Score aligned features (`data[f][i]`) jointly.
    pub fn detect_multivariate_anomalies(
        &self,
        data: &[Vec<f64>],
        timestamps: Option<&[DateTime<Utc>]>,
        method: &AnomalyMethod,
    ) -> Result<MultiVariateAnomalyResult, DetectionError> {
        let n = data.first().map_or(0, Vec::len);
        self.instrumented(metrics::OP_DETECT_MULTIVARIATE, n, || {
            self.multivariate(data, timestamps, method)
        })
    }

    /// Run every method, blend the scores by confidence, and flag on the blend.
    pub fn detect_ensemble_anomalies(
        &self,
        data: &[f64],
        methods: &[AnomalyMethod],
        timestamps: Option<&[DateTime<Utc>]>,
    ) -> Result<AnomalyResult, DetectionError> {
        self.instrumented(metrics::OP_DETECT_ENSEMBLE, data.len(), || {
            self.ensemble(data, methods, timestamps)
        })
    }

    /// Seed a rolling-window detector from `initial_data`.
    pub fn create_realtime_detector(
        &self,
        initial_data: &[f64],
        window_size: usize,
        method: AnomalyMethod,
    ) -> Result<RealTimeAnomalyDetector, DetectionError> {
        self.instrumented(metrics::OP_CREATE_REALTIME, initial_data.len(), || {
            RealTimeAnomalyDetector::new(
                initial_data,
                window_size,
                method,
                self.config.effective_zscore_threshold(),
            )
        })
    }

    /// Seed a rolling-window detector sized by the configured `window_size`.
    pub fn create_configured_realtime_detector(
        &self,
        initial_data: &[f64],
        method: AnomalyMethod,
    ) -> Result<RealTimeAnomalyDetector, DetectionError> {
        self.create_realtime_detector(initial_data, self.config.effective_window_size(), method)
    }

    /// Push one value into `detector` and return it if flagged.
    pub fn update_realtime_detector(
        &self,
        detector: &mut RealTimeAnomalyDetector,
        new_value: f64,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Option<AnomalyPoint>, DetectionError> {
        self.instrumented(metrics::OP_UPDATE_REALTIME, 1, || {
            detector.update(new_value, timestamp)
        })
    }

    /// Time `f`, report the elapsed seconds, and report any failure under `operation`.
    fn instrumented<T>(
        &self,
        operation: &'static str,
        sample_count: usize,
        f: impl FnOnce() -> Result<T, DetectionError>,
    ) -> Result<T, DetectionError> {
        let span = tracing::debug_span!("anomaly", operation, sample_count);
        let _guard = span.enter();
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();
        self.metrics_sink.record(operation, elapsed.as_secs_f64());
        match &result {
            Ok(_) => tracing::debug!(
                detection_time_ms = elapsed.as_millis() as u64,
                "detection complete"
            ),
            Err(e) => {
                tracing::warn!(error = %e, "detection failed");
                self.error_sink.report(e, operation);
            }
        }
        result
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn forest_params(&self, num_trees: usize) -> ForestParams {
        ForestParams {
            num_trees,
            max_samples: self.config.effective_max_samples(),
            parallel: self.config.effective_parallel(),
        }
    }

    fn univariate(
        &self,
        data: &[f64],
        timestamps: Option<&[DateTime<Utc>]>,
        method: &AnomalyMethod,
    ) -> Result<AnomalyResult, DetectionError> {
        validate_series(data)?;
        validate_timestamps(timestamps, data.len())?;

        let (scores, policy) = match method {
            AnomalyMethod::Statistical { threshold } => {
                (zscore::scores(data)?, ThresholdPolicy::Fixed(*threshold))
            }
            AnomalyMethod::IsolationForest {
                num_trees,
                contamination,
            } => {
                let rows = isolation::rows_from_series(data);
                let params = self.forest_params(*num_trees);
                let forest = IsolationForest::fit(&rows, &params, &mut self.rng())?;
                (
                    forest.score_rows(&rows),
                    ThresholdPolicy::Contamination(*contamination),
                )
            }
            AnomalyMethod::LocalOutlierFactor { neighbors } => (
                lof::scores(data, *neighbors)?,
                ThresholdPolicy::Fixed(self.config.effective_lof_threshold()),
            ),
            AnomalyMethod::Ensemble { methods } => return self.ensemble(data, methods, timestamps),
        };

        let threshold = policy.resolve(&scores);
        Ok(build_result(data, timestamps, scores, threshold, method.clone()))
    }

    fn ensemble(
        &self,
        data: &[f64],
        methods: &[AnomalyMethod],
        timestamps: Option<&[DateTime<Utc>]>,
    ) -> Result<AnomalyResult, DetectionError> {
        if methods.is_empty() {
            return Err(DetectionError::InvalidInput(
                "ensemble needs at least one method".to_string(),
            ));
        }
        validate_series(data)?;
        validate_timestamps(timestamps, data.len())?;

        let runs = methods
            .iter()
            .map(|m| self.univariate(data, timestamps, m))
            .collect::<Result<Vec<_>, _>>()?;

        let confidences: Vec<f64> = runs.iter().map(|r| r.confidence).collect();
        let weights = ensemble::normalize_weights(&confidences);
        let score_sets: Vec<Vec<f64>> = runs.iter().map(|r| r.scores.clone()).collect();
        let scores = ensemble::combine(&score_sets, &weights)?;

        // A single member keeps its own threshold policy.
        let threshold = match runs.as_slice() {
            [only] => only.threshold,
            _ => threshold::adaptive_threshold(&scores),
        };

        let mut result = build_result(
            data,
            timestamps,
            scores,
            threshold,
            AnomalyMethod::Ensemble {
                methods: methods.to_vec(),
            },
        );
        tracing::debug!(?weights, "ensemble weights");
        result.metadata.ensemble_weights = Some(weights);
        result.metadata.method_confidences = Some(confidences);
        Ok(result)
    }

    fn multivariate(
        &self,
        data: &[Vec<f64>],
        timestamps: Option<&[DateTime<Utc>]>,
        method: &AnomalyMethod,
    ) -> Result<MultiVariateAnomalyResult, DetectionError> {
        let n = multivariate::validate_features(data)?;
        if data.iter().flatten().any(|v| !v.is_finite()) {
            return Err(DetectionError::InvalidInput(
                "feature matrix contains non-finite values".to_string(),
            ));
        }
        validate_timestamps(timestamps, n)?;

        let (scores, policy, effective_method) = match method {
            AnomalyMethod::Statistical { threshold } => (
                multivariate::statistical_scores(data)?,
                ThresholdPolicy::Fixed(*threshold),
                method.clone(),
            ),
            AnomalyMethod::IsolationForest {
                num_trees,
                contamination,
            } => (
                multivariate::isolation_scores(
                    data,
                    &self.forest_params(*num_trees),
                    &mut self.rng(),
                )?,
                ThresholdPolicy::Contamination(*contamination),
                method.clone(),
            ),
            AnomalyMethod::LocalOutlierFactor { .. } | AnomalyMethod::Ensemble { .. } => {
                tracing::debug!(
                    requested = %method,
                    "multivariate falls back to statistical scoring"
                );
                let threshold = self.config.effective_zscore_threshold();
                (
                    multivariate::statistical_scores(data)?,
                    ThresholdPolicy::Fixed(threshold),
                    AnomalyMethod::Statistical { threshold },
                )
            }
        };

        let MultivariateScores {
            overall,
            contributions,
        } = scores;
        let threshold = policy.resolve(&overall);
        let flagged = threshold::flagged_indices(&overall, threshold);
        let rows = multivariate::to_rows(data, n);

        let anomalies: Vec<MultiVariateAnomalyPoint> = flagged
            .iter()
            .map(|&i| {
                let (severity, _) = threshold::classify(overall[i], threshold, None);
                MultiVariateAnomalyPoint {
                    index: i,
                    values: rows[i].clone(),
                    timestamp: timestamps.map(|ts| ts[i]),
                    overall_score: overall[i],
                    feature_scores: contributions[i].clone(),
                    severity,
                }
            })
            .collect();

        let confidence = threshold::confidence(&overall, threshold, &flagged);
        let mut metadata = DetectionMetadata::new(n, anomalies.len());
        metadata.feature_count = Some(data.len());
        tracing::debug!(
            anomaly_count = anomalies.len(),
            features = data.len(),
            "multivariate scored"
        );

        Ok(MultiVariateAnomalyResult {
            anomalies,
            scores: overall,
            threshold,
            method: effective_method,
            confidence,
            metadata,
        })
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn validate_series(data: &[f64]) -> Result<(), DetectionError> {
    if data.is_empty() {
        return Err(DetectionError::InvalidInput("data is empty".to_string()));
    }
    if let Some(i) = data.iter().position(|v| !v.is_finite()) {
        return Err(DetectionError::InvalidInput(format!(
            "value at index {i} is not finite"
        )));
    }
    Ok(())
}

fn validate_timestamps(
    timestamps: Option<&[DateTime<Utc>]>,
    n: usize,
) -> Result<(), DetectionError> {
    match timestamps {
        Some(ts) if ts.len() != n => Err(DetectionError::InvalidInput(format!(
            "{} timestamps for {n} samples",
            ts.len()
        ))),
        _ => Ok(()),
    }
}

fn build_result(
    data: &[f64],
    timestamps: Option<&[DateTime<Utc>]>,
    scores: Vec<f64>,
    threshold: f64,
    method: AnomalyMethod,
) -> AnomalyResult {
    let flagged = threshold::flagged_indices(&scores, threshold);
    let anomalies: Vec<AnomalyPoint> = flagged
        .iter()
        .map(|&i| {
            let (severity, context) = threshold::classify(scores[i], threshold, None);
            AnomalyPoint {
                index: i,
                value: data[i],
                timestamp: timestamps.map(|ts| ts[i]),
                score: scores[i],
                severity,
                context,
            }
        })
        .collect();
    let confidence = threshold::confidence(&scores, threshold, &flagged);
    let metadata = DetectionMetadata::new(data.len(), anomalies.len());
    tracing::debug!(
        method = %method,
        anomaly_count = anomalies.len(),
        threshold,
        "univariate scored"
    );

    AnomalyResult {
        anomalies,
        scores,
        threshold,
        method,
        confidence,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitalstat_core::traits::{InMemoryErrorSink, InMemoryMetricsSink};

    fn seeded() -> AnomalyDetector {
        AnomalyDetector::new(AnomalyConfig {
            seed: Some(11),
            ..Default::default()
        })
    }

    #[test]
    fn test_statistical_flags_only_spike() {
        let data = [10.0, 10.0, 10.0, 10.0, 10.0, 50.0];
        let method = AnomalyMethod::Statistical { threshold: 2.0 };
        let result = seeded()
            .detect_univariate_anomalies(&data, None, &method)
            .unwrap();
        assert_eq!(result.scores.len(), 6);
        assert_eq!(result.anomalies.len(), 1);
        assert_eq!(result.anomalies[0].index, 5);
        assert_eq!(result.metadata.anomaly_count, 1);
    }

    #[test]
    fn test_seeded_isolation_forest_is_reproducible() {
        let mut data: Vec<f64> = (0..60).map(|i| 60.0 + (i % 9) as f64).collect();
        data[30] = 180.0;
        let detector = seeded();
        let method = detector.isolation_forest_method();
        let a = detector.detect_univariate_anomalies(&data, None, &method).unwrap();
        let b = detector.detect_univariate_anomalies(&data, None, &method).unwrap();
        assert_eq!(a.scores, b.scores);
        assert!(a.anomalies.iter().any(|p| p.index == 30));
    }

    #[test]
    fn test_timestamps_attach_to_points() {
        let data = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 9.0];
        let base = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let ts: Vec<DateTime<Utc>> = (0..8).map(|i| base + chrono::Duration::minutes(i)).collect();
        let result = seeded()
            .detect_univariate_anomalies(&data, Some(&ts), &AnomalyMethod::default())
            .unwrap();
        assert_eq!(result.anomalies[0].timestamp, Some(ts[7]));

        let err = seeded()
            .detect_univariate_anomalies(&data, Some(&ts[..3]), &AnomalyMethod::default())
            .unwrap_err();
        assert!(matches!(err, DetectionError::InvalidInput(_)));
    }

    #[test]
    fn test_failures_reach_error_sink_and_metrics_always_recorded() {
        let errors = Arc::new(InMemoryErrorSink::new());
        let timings = Arc::new(InMemoryMetricsSink::new());
        let detector = AnomalyDetector::with_defaults().with_sinks(errors.clone(), timings.clone());

        let _ = detector.detect_univariate_anomalies(&[], None, &AnomalyMethod::default());
        let _ = detector.detect_univariate_anomalies(
            &[1.0, 2.0, 30.0],
            None,
            &AnomalyMethod::default(),
        );

        let reports = errors.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].context, metrics::OP_DETECT_UNIVARIATE);
        assert_eq!(timings.count(metrics::OP_DETECT_UNIVARIATE), 2);
    }

    #[test]
    fn test_multivariate_lof_falls_back_to_statistical() {
        let data = vec![vec![1.0, 1.1, 0.9, 1.0, 8.0], vec![5.0, 5.1, 4.9, 5.0, 5.0]];
        let method = AnomalyMethod::LocalOutlierFactor { neighbors: 2 };
        let result = seeded()
            .detect_multivariate_anomalies(&data, None, &method)
            .unwrap();
        assert_eq!(result.method.name(), "statistical");
        assert_eq!(result.metadata.feature_count, Some(2));
    }

    #[test]
    fn test_ensemble_variant_delegates() {
        let data: Vec<f64> = (0..30)
            .map(|i| if i == 12 { 40.0 } else { 5.0 + (i % 3) as f64 })
            .collect();
        let methods = vec![
            AnomalyMethod::default(),
            AnomalyMethod::LocalOutlierFactor { neighbors: 3 },
        ];
        let detector = seeded();
        let direct = detector.detect_ensemble_anomalies(&data, &methods, None).unwrap();
        let via_variant = detector
            .detect_univariate_anomalies(&data, None, &AnomalyMethod::Ensemble { methods })
            .unwrap();
        assert_eq!(direct, via_variant);
        let weights = direct.metadata.ensemble_weights.unwrap();
        assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_input_is_invalid() {
        let err = seeded()
            .detect_univariate_anomalies(&[1.0, f64::NAN], None, &AnomalyMethod::default())
            .unwrap_err();
        assert!(matches!(err, DetectionError::InvalidInput(_)));
    }
}
