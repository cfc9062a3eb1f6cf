//! Correlation matrix over N variables.
//!
//! Only the upper triangle is computed; each pair reads shared input and
//! writes its own slot, so pairs fan out across rayon workers.

use rayon::prelude::*;

use vitalstat_core::errors::CorrelationError;

use super::types::{CorrelationResult, MultiVariateCorrelation};

/// Build the symmetric matrices by calling `pair` on every i < j.
pub fn build<F>(
    variables: &[Vec<f64>],
    names: &[String],
    parallel: bool,
    pair: F,
) -> Result<MultiVariateCorrelation, CorrelationError>
where
    F: Fn(&[f64], &[f64]) -> Result<CorrelationResult, CorrelationError> + Sync,
{
    if variables.len() != names.len() {
        return Err(CorrelationError::InvalidInput(format!(
            "{} variables but {} names",
            variables.len(),
            names.len()
        )));
    }

    let n = variables.len();
    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect();

    let compute = |&(i, j): &(usize, usize)| pair(&variables[i], &variables[j]).map(|r| (i, j, r));
    let results: Vec<(usize, usize, CorrelationResult)> = if parallel {
        pairs.par_iter().map(compute).collect::<Result<_, _>>()?
    } else {
        pairs.iter().map(compute).collect::<Result<_, _>>()?
    };

    let mut correlation_matrix = vec![vec![0.0; n]; n];
    let mut significance_matrix = vec![vec![false; n]; n];
    let mut p_value_matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        correlation_matrix[i][i] = 1.0;
        significance_matrix[i][i] = true;
    }
    for (i, j, r) in results {
        correlation_matrix[i][j] = r.coefficient;
        correlation_matrix[j][i] = r.coefficient;
        significance_matrix[i][j] = r.is_significant;
        significance_matrix[j][i] = r.is_significant;
        p_value_matrix[i][j] = r.p_value;
        p_value_matrix[j][i] = r.p_value;
    }

    Ok(MultiVariateCorrelation {
        correlation_matrix,
        variable_names: names.to_vec(),
        significance_matrix,
        p_value_matrix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::types::CorrelationType;

    fn fake_pair(x: &[f64], y: &[f64]) -> Result<CorrelationResult, CorrelationError> {
        let c = (x[0] - y[0]) / 10.0;
        Ok(CorrelationResult {
            coefficient: c,
            p_value: c.abs(),
            confidence_interval: (-1.0, 1.0),
            sample_size: x.len(),
            is_significant: c.abs() < 0.05,
            correlation_type: CorrelationType::Pearson,
        })
    }

    #[test]
    fn test_pairs_mirror_into_lower_triangle() {
        let vars = vec![vec![1.0], vec![3.0], vec![6.0]];
        let names: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let m = build(&vars, &names, false, fake_pair).unwrap();
        assert_eq!(m.correlation_matrix[0][1], -0.2);
        assert_eq!(m.correlation_matrix[1][0], -0.2);
        assert_eq!(m.correlation_matrix[0][2], m.correlation_matrix[2][0]);
        for i in 0..3 {
            assert_eq!(m.correlation_matrix[i][i], 1.0);
            assert!(m.significance_matrix[i][i]);
            assert_eq!(m.p_value_matrix[i][i], 0.0);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let vars: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64 * 1.5]).collect();
        let names: Vec<String> = (0..6).map(|i| format!("v{i}")).collect();
        let seq = build(&vars, &names, false, fake_pair).unwrap();
        let par = build(&vars, &names, true, fake_pair).unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn test_name_count_mismatch() {
        let err = build(&[vec![1.0]], &[], false, fake_pair).unwrap_err();
        assert!(matches!(err, CorrelationError::InvalidInput(_)));
    }

    #[test]
    fn test_zero_variables_is_empty() {
        let m = build(&[], &[], true, fake_pair).unwrap();
        assert!(m.is_empty());
        assert!(m.correlation_matrix.is_empty());
    }

    #[test]
    fn test_pair_error_propagates() {
        let failing = |_: &[f64], _: &[f64]| -> Result<CorrelationResult, CorrelationError> {
            Err(CorrelationError::InsufficientData {
                required: 3,
                actual: 1,
            })
        };
        let names = vec!["a".to_string(), "b".to_string()];
        let err = build(&[vec![1.0], vec![2.0]], &names, true, failing).unwrap_err();
        assert!(matches!(err, CorrelationError::InsufficientData { .. }));
    }
}
