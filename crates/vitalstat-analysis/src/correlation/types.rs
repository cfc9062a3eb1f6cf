//! Correlation result types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Association measure to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationType {
    #[default]
    Pearson,
    Spearman,
    Kendall,
}

impl CorrelationType {
    pub const ALL: [CorrelationType; 3] = [Self::Pearson, Self::Spearman, Self::Kendall];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pearson => "pearson",
            Self::Spearman => "spearman",
            Self::Kendall => "kendall",
        }
    }
}

impl fmt::Display for CorrelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coefficient of one variable pair with its significance test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    /// In [-1, 1].
    pub coefficient: f64,
    /// In [0, 1].
    pub p_value: f64,
    /// Fisher-z interval `(lower, upper)` at the configured confidence level.
    pub confidence_interval: (f64, f64),
    /// Pairs remaining after non-finite values were dropped.
    pub sample_size: usize,
    pub is_significant: bool,
    pub correlation_type: CorrelationType,
}

/// Pairwise correlations over N named variables.
///
/// All three matrices are N×N and symmetric. The diagonal is fixed to
/// 1.0 / true / 0.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiVariateCorrelation {
    pub correlation_matrix: Vec<Vec<f64>>,
    pub variable_names: Vec<String>,
    pub significance_matrix: Vec<Vec<bool>>,
    pub p_value_matrix: Vec<Vec<f64>>,
}

impl MultiVariateCorrelation {
    /// Coefficient between two named variables, if both exist.
    pub fn coefficient(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.variable_names.iter().position(|n| n == a)?;
        let j = self.variable_names.iter().position(|n| n == b)?;
        Some(self.correlation_matrix[i][j])
    }

    pub fn len(&self) -> usize {
        self.variable_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variable_names.is_empty()
    }
}
