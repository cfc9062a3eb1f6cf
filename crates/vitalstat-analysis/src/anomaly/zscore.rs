//! Z-score scoring against the sample mean and population standard deviation.

use vitalstat_core::errors::DetectionError;

use crate::stats;

/// `|x − μ| / σ` for every value; all zeros when σ is zero.
///
/// `values` must be non-empty.
pub fn scores(values: &[f64]) -> Result<Vec<f64>, DetectionError> {
    if values.is_empty() {
        return Err(DetectionError::InvalidInput(
            "cannot score an empty series".to_string(),
        ));
    }
    let (mean, std) = stats::mean_and_std(values);
    if std <= 0.0 {
        return Ok(vec![0.0; values.len()]);
    }
    Ok(values.iter().map(|v| (v - mean).abs() / std).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_spike() {
        let data = [10.0, 10.0, 10.0, 10.0, 10.0, 50.0];
        let s = scores(&data).unwrap();
        let mean: f64 = 100.0 / 6.0;
        let var = (5.0 * (10.0 - mean) * (10.0 - mean) + (50.0 - mean) * (50.0 - mean)) / 6.0;
        let expected = (50.0 - mean) / var.sqrt();
        assert!((s[5] - expected).abs() < 1e-12);
        assert!(s[..5].iter().all(|&z| z < 2.0));
        assert!(s[5] > 2.0);
    }

    #[test]
    fn test_constant_series_scores_zero() {
        assert_eq!(scores(&[4.0; 7]).unwrap(), vec![0.0; 7]);
    }

    #[test]
    fn test_empty_is_invalid_input() {
        assert!(matches!(scores(&[]), Err(DetectionError::InvalidInput(_))));
    }
}
