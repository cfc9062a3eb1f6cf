//! Correlation errors.

use super::error_code::{self, VitalstatErrorCode};

/// Errors that can occur while computing correlations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CorrelationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient data: need at least {required} valid pairs, got {actual}")]
    InsufficientData { required: usize, actual: usize },
}

impl VitalstatErrorCode for CorrelationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => error_code::INVALID_INPUT,
            Self::InsufficientData { .. } => error_code::INSUFFICIENT_DATA,
        }
    }
}
