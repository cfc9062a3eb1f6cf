//! Top-level error aggregating the subsystem errors.

use super::error_code::VitalstatErrorCode;
use super::{ConfigError, CorrelationError, DetectionError};

/// Umbrella error for callers that drive several subsystems at once.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error(transparent)]
    Correlation(#[from] CorrelationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl VitalstatErrorCode for AnalyticsError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Detection(e) => e.error_code(),
            Self::Correlation(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
        }
    }
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
