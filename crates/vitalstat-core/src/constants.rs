//! Numeric constants shared across the analysis engine.

/// Euler–Mascheroni constant, used by the isolation-forest path normalizer.
pub const EULER_GAMMA: f64 = 0.577_215_664_9;

/// Floor applied to standard deviations before dividing by them.
pub const STD_FLOOR: f64 = 1e-10;

/// Upper bound on the isolation-forest subsample size.
pub const MAX_ISOLATION_SAMPLES: usize = 256;

/// Multiplier on the standard deviation for the adaptive threshold policy.
pub const ADAPTIVE_THRESHOLD_SIGMAS: f64 = 2.0;

/// Severity ratio (score / threshold) boundaries.
pub const SEVERITY_CRITICAL_RATIO: f64 = 3.0;
pub const SEVERITY_HIGH_RATIO: f64 = 2.0;
pub const SEVERITY_MEDIUM_RATIO: f64 = 1.5;

/// Minimum number of finite paired samples for a correlation.
pub const MIN_CORRELATION_SAMPLES: usize = 3;

/// Project-level config file name.
pub const CONFIG_FILE_NAME: &str = "vitalstat.toml";
