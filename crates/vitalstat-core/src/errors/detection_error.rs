//! Anomaly detection errors.

use super::error_code::{self, VitalstatErrorCode};

/// Errors that can occur during anomaly scoring and real-time monitoring.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DetectionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid model: {0}")]
    InvalidModel(String),
}

impl VitalstatErrorCode for DetectionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => error_code::INVALID_INPUT,
            Self::InsufficientData(_) => error_code::INSUFFICIENT_DATA,
            Self::InvalidModel(_) => error_code::INVALID_MODEL,
        }
    }
}
