//! Multivariate scoring over aligned features.
//!
//! Input is feature-major: `features[f][i]` is sample `i` of feature `f`.
//! Both modes return an overall score per sample and a per-feature
//! contribution vector per sample.

use rand::Rng;

use vitalstat_core::constants::STD_FLOOR;
use vitalstat_core::errors::DetectionError;

use super::isolation::{ForestParams, IsolationForest};
use crate::stats;

/// Overall and per-feature scores for every sample.
#[derive(Debug, Clone, PartialEq)]
pub struct MultivariateScores {
    /// One overall score per sample.
    pub overall: Vec<f64>,
    /// `contributions[i][f]`: contribution of feature `f` to sample `i`.
    pub contributions: Vec<Vec<f64>>,
}

/// Check the feature matrix and return the shared sample count.
pub fn validate_features(features: &[Vec<f64>]) -> Result<usize, DetectionError> {
    let Some(first) = features.first() else {
        return Err(DetectionError::InvalidInput(
            "feature matrix has no features".to_string(),
        ));
    };
    let n = first.len();
    if n == 0 {
        return Err(DetectionError::InvalidInput(
            "feature matrix has no samples".to_string(),
        ));
    }
    if let Some((f, col)) = features.iter().enumerate().find(|(_, c)| c.len() != n) {
        return Err(DetectionError::InvalidInput(format!(
            "feature {f} has {} samples, expected {n}",
            col.len()
        )));
    }
    Ok(n)
}

/// Sample-major view: `rows[i][f]`.
pub fn to_rows(features: &[Vec<f64>], n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| features.iter().map(|col| col[i]).collect())
        .collect()
}

/// Diagonal-covariance Mahalanobis approximation.
///
/// Contribution = |x − μ_f| / max(σ_f, 1e-10);
/// overall = sqrt(mean of squared contributions).
pub fn statistical_scores(features: &[Vec<f64>]) -> Result<MultivariateScores, DetectionError> {
    let n = validate_features(features)?;
    let moments: Vec<(f64, f64)> = features
        .iter()
        .map(|col| {
            let (mean, std) = stats::mean_and_std(col);
            (mean, std.max(STD_FLOOR))
        })
        .collect();

    let num_features = features.len() as f64;
    let mut overall = Vec::with_capacity(n);
    let mut contributions = Vec::with_capacity(n);
    for i in 0..n {
        let deviations: Vec<f64> = features
            .iter()
            .zip(&moments)
            .map(|(col, (mean, std))| (col[i] - mean).abs() / std)
            .collect();
        let mean_sq = deviations.iter().map(|d| d * d).sum::<f64>() / num_features;
        overall.push(mean_sq.sqrt());
        contributions.push(deviations);
    }
    Ok(MultivariateScores {
        overall,
        contributions,
    })
}

/// Multivariate isolation forest over row subsamples.
///
/// Each tree's score is split evenly across features, so a feature's
/// contribution is `overall / num_features`.
pub fn isolation_scores<R: Rng>(
    features: &[Vec<f64>],
    params: &ForestParams,
    rng: &mut R,
) -> Result<MultivariateScores, DetectionError> {
    let n = validate_features(features)?;
    let rows = to_rows(features, n);
    let forest = IsolationForest::fit(&rows, params, rng)?;
    let num_features = features.len();
    let num_trees = forest.trees().len() as f64;

    let mut overall = Vec::with_capacity(n);
    let mut contributions = Vec::with_capacity(n);
    for row in &rows {
        let mut per_feature = vec![0.0; num_features];
        let mut total = 0.0;
        for tree_score in forest.tree_scores(row) {
            total += tree_score;
            let share = tree_score / num_features as f64;
            per_feature.iter_mut().for_each(|c| *c += share);
        }
        overall.push(total / num_trees);
        per_feature.iter_mut().for_each(|c| *c /= num_trees);
        contributions.push(per_feature);
    }
    Ok(MultivariateScores {
        overall,
        contributions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn two_features_with_outlier() -> Vec<Vec<f64>> {
        let mut heart_rate: Vec<f64> = (0..40).map(|i| 70.0 + (i % 5) as f64).collect();
        let mut spo2: Vec<f64> = (0..40).map(|i| 97.0 + (i % 3) as f64 * 0.5).collect();
        heart_rate.push(150.0);
        spo2.push(85.0);
        vec![heart_rate, spo2]
    }

    #[test]
    fn test_statistical_overall_is_rms_of_contributions() {
        let features = two_features_with_outlier();
        let scores = statistical_scores(&features).unwrap();
        assert_eq!(scores.overall.len(), 41);
        for (overall, contrib) in scores.overall.iter().zip(&scores.contributions) {
            let rms = ((contrib[0].powi(2) + contrib[1].powi(2)) / 2.0).sqrt();
            assert!((overall - rms).abs() < 1e-12);
        }
        let max_idx = scores
            .overall
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(max_idx, 40);
    }

    #[test]
    fn test_constant_feature_uses_std_floor() {
        let features = vec![vec![1.0, 1.0, 1.0], vec![1.0, 2.0, 3.0]];
        let scores = statistical_scores(&features).unwrap();
        assert!(scores.contributions.iter().all(|c| c[0] == 0.0));
    }

    #[test]
    fn test_isolation_contributions_split_evenly() {
        let features = two_features_with_outlier();
        let params = ForestParams {
            num_trees: 30,
            ..Default::default()
        };
        let scores = isolation_scores(&features, &params, &mut StdRng::seed_from_u64(5)).unwrap();
        for (overall, contrib) in scores.overall.iter().zip(&scores.contributions) {
            assert!((0.0..=1.0).contains(overall));
            assert!((contrib[0] - overall / 2.0).abs() < 1e-9);
            assert!((contrib[0] - contrib[1]).abs() < 1e-12);
        }
        let median = crate::stats::median(&scores.overall[..40]);
        assert!(scores.overall[40] > median);
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(statistical_scores(&[]), Err(DetectionError::InvalidInput(_))));
        assert!(matches!(
            statistical_scores(&[vec![]]),
            Err(DetectionError::InvalidInput(_))
        ));
        assert!(matches!(
            statistical_scores(&[vec![1.0, 2.0], vec![1.0]]),
            Err(DetectionError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_to_rows_transposes() {
        let rows = to_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]], 2);
        assert_eq!(rows, vec![vec![1.0, 3.0], vec![2.0, 4.0]]);
    }
}
