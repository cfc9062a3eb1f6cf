//! Significance tests and Fisher-z confidence intervals via `statrs`.
//!
//! p-values use the normal approximation for every coefficient type.

use statrs::distribution::{ContinuousCDF, Normal};

use super::types::CorrelationType;

/// Largest |r| fed to the Fisher transform; keeps `atanh` finite.
const FISHER_R_LIMIT: f64 = 1.0 - 1e-12;

/// Two-sided p-value for `coefficient` over `n` pairs.
pub fn p_value(coefficient: f64, n: usize, correlation_type: CorrelationType) -> f64 {
    match correlation_type {
        CorrelationType::Pearson | CorrelationType::Spearman => t_test_p_value(coefficient, n),
        CorrelationType::Kendall => kendall_p_value(coefficient, n),
    }
}

/// t = r·√((n−2)/(1−r²)), p = 2·(1−Φ(|t|)).
///
/// A perfect correlation has zero residual variance and returns 0.
pub fn t_test_p_value(r: f64, n: usize) -> f64 {
    if n < 3 {
        return 1.0;
    }
    let residual = 1.0 - r * r;
    if residual <= 0.0 {
        return 0.0;
    }
    let t = r * ((n as f64 - 2.0) / residual).sqrt();
    two_sided_normal(t)
}

/// z = τ / √(2(2n+5) / (9n(n−1))), p = 2·(1−Φ(|z|)).
pub fn kendall_p_value(tau: f64, n: usize) -> f64 {
    if n < 2 {
        return 1.0;
    }
    let nf = n as f64;
    let variance = 2.0 * (2.0 * nf + 5.0) / (9.0 * nf * (nf - 1.0));
    if variance <= 0.0 || !variance.is_finite() {
        return 1.0;
    }
    two_sided_normal(tau / variance.sqrt())
}

/// Fisher-z interval for `r` at `confidence_level`.
///
/// With n ≤ 3 the standard error is undefined and the full range is returned.
pub fn fisher_interval(r: f64, n: usize, confidence_level: f64) -> (f64, f64) {
    if n <= 3 {
        return (-1.0, 1.0);
    }
    let z = r.clamp(-FISHER_R_LIMIT, FISHER_R_LIMIT).atanh();
    let se = 1.0 / ((n as f64) - 3.0).sqrt();
    let margin = critical_value(confidence_level) * se;
    ((z - margin).tanh(), (z + margin).tanh())
}

/// Two-sided standard normal quantile, 1.96 at 95%.
pub fn critical_value(confidence_level: f64) -> f64 {
    let level = confidence_level.clamp(f64::EPSILON, 1.0 - f64::EPSILON);
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.inverse_cdf(1.0 - (1.0 - level) / 2.0),
        Err(_) => 1.96,
    }
}

fn two_sided_normal(statistic: f64) -> f64 {
    if !statistic.is_finite() {
        return 0.0;
    }
    match Normal::new(0.0, 1.0) {
        Ok(normal) => (2.0 * (1.0 - normal.cdf(statistic.abs()))).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_correlation_p_value_zero() {
        assert_eq!(t_test_p_value(1.0, 5), 0.0);
        assert_eq!(t_test_p_value(-1.0, 5), 0.0);
    }

    #[test]
    fn test_zero_correlation_p_value_one() {
        assert!((t_test_p_value(0.0, 30) - 1.0).abs() < 1e-12);
        assert!((kendall_p_value(0.0, 30) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_p_value_shrinks_with_sample_size() {
        assert!(t_test_p_value(0.4, 100) < t_test_p_value(0.4, 10));
    }

    #[test]
    fn test_critical_value_95() {
        assert!((critical_value(0.95) - 1.959_964).abs() < 1e-4);
    }

    #[test]
    fn test_fisher_interval_contains_r() {
        let (lo, hi) = fisher_interval(0.6, 50, 0.95);
        assert!(lo < 0.6 && 0.6 < hi);
        assert!(lo > -1.0 && hi < 1.0);
    }

    #[test]
    fn test_fisher_interval_small_n_full_range() {
        assert_eq!(fisher_interval(0.9, 3, 0.95), (-1.0, 1.0));
    }

    #[test]
    fn test_fisher_interval_perfect_r_is_finite() {
        let (lo, hi) = fisher_interval(1.0, 10, 0.95);
        assert!(lo.is_finite() && hi.is_finite());
        assert!(hi <= 1.0);
    }
}
