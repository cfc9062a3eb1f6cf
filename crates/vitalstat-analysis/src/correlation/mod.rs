//! Correlation analysis: Pearson, Spearman and Kendall coefficients with
//! p-values, Fisher-z confidence intervals and N×N matrices.

pub mod coefficients;
pub mod engine;
pub mod matrix;
pub mod significance;
pub mod types;

pub use engine::CorrelationEngine;
pub use types::{CorrelationResult, CorrelationType, MultiVariateCorrelation};
