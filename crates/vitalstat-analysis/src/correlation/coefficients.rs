//! Pearson, Spearman and Kendall coefficients over equal-length slices.
//!
//! Callers filter non-finite pairs and enforce the minimum sample count;
//! these functions only guard degenerate denominators.

use std::cmp::Ordering;

/// Pearson r via the sums formula. Zero when either series is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n == 0 {
        return 0.0;
    }
    let nf = n as f64;
    let (mut sx, mut sy, mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for (&a, &b) in x.iter().zip(y) {
        sx += a;
        sy += b;
        sxy += a * b;
        sxx += a * a;
        syy += b * b;
    }
    let numerator = nf * sxy - sx * sy;
    let denominator = ((nf * sxx - sx * sx) * (nf * syy - sy * sy)).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    (numerator / denominator).clamp(-1.0, 1.0)
}

/// 1-based ranks. Ties are broken by position, earlier first.
pub fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    // sort_by is stable, so equal values keep their input order.
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let mut ranks = vec![0.0; values.len()];
    for (rank, &i) in order.iter().enumerate() {
        ranks[i] = (rank + 1) as f64;
    }
    ranks
}

/// Pearson r on the ranks of both series.
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    pearson(&ranks(x), &ranks(y))
}

/// Kendall tau-a: (concordant − discordant) / total pairs.
pub fn kendall(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }
    let mut concordant = 0i64;
    let mut discordant = 0i64;
    for i in 0..n {
        for j in (i + 1)..n {
            match (x[i].total_cmp(&x[j]), y[i].total_cmp(&y[j])) {
                (Ordering::Equal, _) | (_, Ordering::Equal) => {}
                (a, b) if a == b => concordant += 1,
                _ => discordant += 1,
            }
        }
    }
    let total_pairs = (n * (n - 1) / 2) as f64;
    ((concordant - discordant) as f64 / total_pairs).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pearson_perfect_linear() {
        let r = pearson(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 6.0, 8.0, 10.0]);
        assert!((r - 1.0).abs() < 1e-12);
        let r = pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]);
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_constant_series_is_zero() {
        assert_eq!(pearson(&[4.0, 4.0, 4.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_ranks_break_ties_by_position() {
        assert_eq!(ranks(&[30.0, 10.0, 20.0, 10.0]), vec![4.0, 1.0, 3.0, 2.0]);
    }

    #[test]
    fn test_spearman_monotone_nonlinear() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y: Vec<f64> = x.iter().map(|v: &f64| v.powi(3)).collect();
        assert!((spearman(&x, &y) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_kendall_extremes() {
        assert_eq!(kendall(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 1.0);
        assert_eq!(kendall(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]), -1.0);
    }

    #[test]
    fn test_kendall_ties_count_as_neither() {
        // pairs: (0,1) tie in x, (0,2) concordant, (1,2) concordant
        let tau = kendall(&[1.0, 1.0, 2.0], &[1.0, 2.0, 3.0]);
        assert!((tau - 2.0 / 3.0).abs() < 1e-12);
    }
}
