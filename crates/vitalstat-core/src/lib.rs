//! Vitalstat core: errors, configuration, tracing, collaborator traits and
//! constants shared by the analysis engine.

pub mod config;
pub mod constants;
pub mod errors;
pub mod tracing;
pub mod traits;

pub use config::VitalstatConfig;
pub use errors::{AnalyticsError, AnalyticsResult};
