//! Error handling for Vitalstat.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod analytics_error;
pub mod config_error;
pub mod correlation_error;
pub mod detection_error;
pub mod error_code;

pub use analytics_error::{AnalyticsError, AnalyticsResult};
pub use config_error::ConfigError;
pub use correlation_error::CorrelationError;
pub use detection_error::DetectionError;
pub use error_code::VitalstatErrorCode;
