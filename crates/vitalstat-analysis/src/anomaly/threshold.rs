//! Threshold policies, anomaly extraction, and confidence.
//!
//! Every detection path flags exactly the indices with `score > threshold`
//! and maps `score / threshold` onto a severity tier.

use vitalstat_core::constants::ADAPTIVE_THRESHOLD_SIGMAS;

use super::types::{AnomalyContext, Severity};
use crate::stats;

/// How a detection threshold is obtained from a score vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdPolicy {
    /// A caller-supplied constant.
    Fixed(f64),
    /// The score at rank `⌊n·fraction⌋` of the descending sort.
    Contamination(f64),
    /// `mean + 2·std` of the scores.
    Adaptive,
}

impl ThresholdPolicy {
    pub fn resolve(&self, scores: &[f64]) -> f64 {
        match *self {
            Self::Fixed(t) => t,
            Self::Contamination(fraction) => contamination_threshold(scores, fraction),
            Self::Adaptive => adaptive_threshold(scores),
        }
    }
}

/// `mean + 2·std` of the scores.
pub fn adaptive_threshold(scores: &[f64]) -> f64 {
    let (mean, std) = stats::mean_and_std(scores);
    mean + ADAPTIVE_THRESHOLD_SIGMAS * std
}

/// Score at index `⌊n·contamination⌋` of the descending sort, clamped to a valid index.
pub fn contamination_threshold(scores: &[f64], contamination: f64) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    let raw = (scores.len() as f64 * contamination).floor();
    let idx = if raw.is_finite() && raw > 0.0 {
        (raw as usize).min(sorted.len() - 1)
    } else {
        0
    };
    sorted[idx]
}

/// Indices whose score strictly exceeds the threshold, ascending.
pub fn flagged_indices(scores: &[f64], threshold: f64) -> Vec<usize> {
    scores
        .iter()
        .enumerate()
        .filter(|(_, &s)| s > threshold)
        .map(|(i, _)| i)
        .collect()
}

/// `score / threshold`, infinite when the threshold is zero.
pub fn severity_ratio(score: f64, threshold: f64) -> f64 {
    if threshold.abs() > f64::EPSILON {
        score / threshold
    } else {
        f64::INFINITY
    }
}

/// Severity and context for a score that exceeded `threshold`.
pub fn classify(
    score: f64,
    threshold: f64,
    window_size: Option<usize>,
) -> (Severity, AnomalyContext) {
    let ratio = severity_ratio(score, threshold);
    (
        Severity::from_ratio(ratio),
        AnomalyContext {
            threshold,
            severity_ratio: ratio,
            window_size,
        },
    )
}

/// Aggregate confidence in [0.0, 1.0].
///
/// With anomalies: the mean relative margin by which flagged scores clear
/// the threshold, each capped at 1. Without: the relative margin between
/// the threshold and the highest score.
pub fn confidence(scores: &[f64], threshold: f64, flagged: &[usize]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let scale = threshold.abs().max(f64::EPSILON);
    let value = if flagged.is_empty() {
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (threshold - max) / scale
    } else {
        flagged
            .iter()
            .map(|&i| ((scores[i] - threshold) / scale).min(1.0))
            .sum::<f64>()
            / flagged.len() as f64
    };
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
