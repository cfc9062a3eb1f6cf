//! Configuration system for Vitalstat.
//! TOML-based, layered resolution: CLI > env > project > user > defaults.

pub mod anomaly_config;
pub mod correlation_config;
pub mod vitalstat_config;

pub use anomaly_config::AnomalyConfig;
pub use correlation_config::CorrelationConfig;
pub use vitalstat_config::{CliOverrides, VitalstatConfig};
