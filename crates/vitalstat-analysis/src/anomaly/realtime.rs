//! Sliding-window real-time detector.
//!
//! Holds a bounded FIFO of recent values and a model trained at creation.
//! The detector is plain mutable state: callers sharing one across threads
//! must serialize `update` themselves (a `Mutex`, an actor, or one consumer).

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vitalstat_core::constants::STD_FLOOR;
use vitalstat_core::errors::DetectionError;

use super::threshold;
use super::types::{AnomalyMethod, AnomalyPoint};
use crate::stats;

/// Parameters learned from the seed window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TrainedModel {
    Statistical { mean: f64, std: f64 },
}

impl TrainedModel {
    fn fit(values: &VecDeque<f64>) -> Self {
        let (front, back) = values.as_slices();
        let (mean, std) = if back.is_empty() {
            stats::mean_and_std(front)
        } else {
            stats::mean_and_std(&values.iter().copied().collect::<Vec<_>>())
        };
        Self::Statistical { mean, std }
    }
}

/// Rolling-window anomaly monitor for one series.
#[derive(Debug, Clone)]
pub struct RealTimeAnomalyDetector {
    window_size: usize,
    method: AnomalyMethod,
    threshold: f64,
    history: VecDeque<f64>,
    model: Option<TrainedModel>,
    /// Values seen so far, seed data included; the next value's stream index.
    observed: usize,
}

impl RealTimeAnomalyDetector {
    /// Seed from the last `window_size` points of `initial` and train.
    ///
    /// `fallback_threshold` is the z-score threshold used by methods that
    /// do not carry a statistical threshold of their own.
    pub fn new(
        initial: &[f64],
        window_size: usize,
        method: AnomalyMethod,
        fallback_threshold: f64,
    ) -> Result<Self, DetectionError> {
        if window_size == 0 {
            return Err(DetectionError::InvalidInput(
                "window size must be greater than 0".to_string(),
            ));
        }
        if initial.len() < window_size {
            return Err(DetectionError::InsufficientData(format!(
                "need at least {window_size} seed points, got {}",
                initial.len()
            )));
        }
        if initial.iter().any(|v| !v.is_finite()) {
            return Err(DetectionError::InvalidInput(
                "seed data contains non-finite values".to_string(),
            ));
        }

        let mut history = VecDeque::with_capacity(window_size + 1);
        history.extend(initial[initial.len() - window_size..].iter().copied());
        let threshold = match method {
            AnomalyMethod::Statistical { threshold } => threshold,
            _ => fallback_threshold,
        };
        let model = Some(TrainedModel::fit(&history));

        Ok(Self {
            window_size,
            method,
            threshold,
            history,
            model,
            observed: initial.len(),
        })
    }

    /// Push `value`, evict the oldest beyond capacity, and score it.
    ///
    /// Returns the flagged point when the score exceeds the threshold.
    pub fn update(
        &mut self,
        value: f64,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Option<AnomalyPoint>, DetectionError> {
        if !value.is_finite() {
            return Err(DetectionError::InvalidInput(format!(
                "cannot score non-finite value {value}"
            )));
        }

        // Statistical scoring needs its model; check before mutating.
        let statistical_model = match (&self.method, self.model) {
            (AnomalyMethod::Statistical { .. }, Some(TrainedModel::Statistical { mean, std })) => {
                Some((mean, std))
            }
            (AnomalyMethod::Statistical { .. }, None) => {
                return Err(DetectionError::InvalidModel(
                    "statistical detector has no trained mean/std".to_string(),
                ));
            }
            _ => None,
        };

        self.history.push_back(value);
        while self.history.len() > self.window_size {
            self.history.pop_front();
        }
        let index = self.observed;
        self.observed += 1;

        let (mean, std) = match statistical_model {
            Some(params) => params,
            None => match TrainedModel::fit(&self.history) {
                TrainedModel::Statistical { mean, std } => (mean, std),
            },
        };
        let score = (value - mean).abs() / std.max(STD_FLOOR);

        if score <= self.threshold {
            return Ok(None);
        }
        let (severity, context) =
            threshold::classify(score, self.threshold, Some(self.window_size));
        tracing::debug!(index, score, %severity, "real-time anomaly");
        Ok(Some(AnomalyPoint {
            index,
            value,
            timestamp,
            score,
            severity,
            context,
        }))
    }

    /// Refit the model on the current window.
    pub fn retrain(&mut self) {
        self.model = Some(TrainedModel::fit(&self.history));
    }

    /// Replace the trained model, e.g. with one restored by the caller.
    pub fn set_model(&mut self, model: Option<TrainedModel>) {
        self.model = model;
    }

    pub fn model(&self) -> Option<&TrainedModel> {
        self.model.as_ref()
    }

    /// Current window contents, oldest first.
    pub fn history(&self) -> &VecDeque<f64> {
        &self.history
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn method(&self) -> &AnomalyMethod {
        &self.method
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Number of values seen, seed data included.
    pub fn observed(&self) -> usize {
        self.observed
    }
}
