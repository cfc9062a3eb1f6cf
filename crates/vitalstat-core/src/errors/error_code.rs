//! VitalstatErrorCode trait for the orchestration boundary.

/// Every error enum implements this to expose a structured error code
/// string to the calling analytics layer.
pub trait VitalstatErrorCode {
    /// Returns the error code string (e.g., "INVALID_INPUT").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted boundary string: `[ERROR_CODE] message`.
    fn boundary_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const INVALID_INPUT: &str = "INVALID_INPUT";
pub const INSUFFICIENT_DATA: &str = "INSUFFICIENT_DATA";
pub const INVALID_MODEL: &str = "INVALID_MODEL";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
