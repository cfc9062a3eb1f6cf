//! Confidence-weighted blending of per-method score vectors.
//!
//! Weights come from the confidence each method reported on the same run
//! that is being combined.

use vitalstat_core::errors::DetectionError;

/// Normalize confidences to weights summing to 1.
///
/// Falls back to equal weights when every confidence is zero or non-finite.
pub fn normalize_weights(confidences: &[f64]) -> Vec<f64> {
    let cleaned: Vec<f64> = confidences
        .iter()
        .map(|c| if c.is_finite() { c.max(0.0) } else { 0.0 })
        .collect();
    let total: f64 = cleaned.iter().sum();
    if total <= 0.0 {
        let equal = 1.0 / confidences.len().max(1) as f64;
        return vec![equal; confidences.len()];
    }
    cleaned.into_iter().map(|c| c / total).collect()
}

/// `score[i] = Σ_j weight[j] · scores[j][i]`.
pub fn combine(score_sets: &[Vec<f64>], weights: &[f64]) -> Result<Vec<f64>, DetectionError> {
    let Some(first) = score_sets.first() else {
        return Err(DetectionError::InvalidInput(
            "ensemble needs at least one method".to_string(),
        ));
    };
    if score_sets.len() != weights.len() {
        return Err(DetectionError::InvalidInput(format!(
            "{} score vectors but {} weights",
            score_sets.len(),
            weights.len()
        )));
    }
    let n = first.len();
    if score_sets.iter().any(|s| s.len() != n) {
        return Err(DetectionError::InvalidInput(
            "ensemble score vectors differ in length".to_string(),
        ));
    }
    Ok((0..n)
        .map(|i| {
            score_sets
                .iter()
                .zip(weights)
                .map(|(scores, w)| w * scores[i])
                .sum::<f64>()
        })
        .collect())
}
