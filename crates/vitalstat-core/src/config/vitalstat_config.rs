//! Top-level Vitalstat configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{AnomalyConfig, CorrelationConfig};
use crate::constants::CONFIG_FILE_NAME;
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`VITALSTAT_*`)
/// 3. Project config (`vitalstat.toml` in project root)
/// 4. User config (`~/.vitalstat/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VitalstatConfig {
    pub anomaly: AnomalyConfig,
    pub correlation: CorrelationConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub seed: Option<u64>,
    pub num_trees: Option<usize>,
    pub contamination: Option<f64>,
    pub significance_level: Option<f64>,
}

impl VitalstatConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Lowest priority: user config. Parse failures are fatal, unreadable files are not.
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(e @ ConfigError::ParseError { .. }) => return Err(e),
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring unreadable user config");
                    }
                }
            }
        }

        let project_config_path = root.join(CONFIG_FILE_NAME);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::apply_env_overrides(&mut config);

        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(config: &VitalstatConfig) -> Result<(), ConfigError> {
        let anomaly = &config.anomaly;
        if let Some(c) = anomaly.contamination {
            if !(c > 0.0 && c <= 0.5) {
                return Err(invalid("anomaly.contamination", "must be in (0.0, 0.5]"));
            }
        }
        if let Some(t) = anomaly.zscore_threshold {
            if !(t > 0.0 && t.is_finite()) {
                return Err(invalid("anomaly.zscore_threshold", "must be a positive number"));
            }
        }
        if let Some(t) = anomaly.lof_threshold {
            if !(t > 0.0 && t.is_finite()) {
                return Err(invalid("anomaly.lof_threshold", "must be a positive number"));
            }
        }
        if anomaly.num_trees == Some(0) {
            return Err(invalid("anomaly.num_trees", "must be greater than 0"));
        }
        if anomaly.max_samples == Some(0) {
            return Err(invalid("anomaly.max_samples", "must be greater than 0"));
        }
        if anomaly.lof_neighbors == Some(0) {
            return Err(invalid("anomaly.lof_neighbors", "must be greater than 0"));
        }
        if anomaly.window_size == Some(0) {
            return Err(invalid("anomaly.window_size", "must be greater than 0"));
        }

        let correlation = &config.correlation;
        if let Some(level) = correlation.significance_level {
            if !(level > 0.0 && level < 1.0) {
                return Err(invalid(
                    "correlation.significance_level",
                    "must be between 0.0 and 1.0",
                ));
            }
        }
        if let Some(level) = correlation.confidence_level {
            if !(level > 0.0 && level < 1.0) {
                return Err(invalid("correlation.confidence_level", "must be between 0.0 and 1.0"));
            }
        }
        Ok(())
    }

    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".vitalstat").join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored.
    fn merge_toml_file(config: &mut VitalstatConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: VitalstatConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; `Some` values in `other` win.
    fn merge(base: &mut VitalstatConfig, other: &VitalstatConfig) {
        let (a, o) = (&mut base.anomaly, &other.anomaly);
        merge_opt(&mut a.zscore_threshold, o.zscore_threshold);
        merge_opt(&mut a.num_trees, o.num_trees);
        merge_opt(&mut a.contamination, o.contamination);
        merge_opt(&mut a.max_samples, o.max_samples);
        merge_opt(&mut a.lof_neighbors, o.lof_neighbors);
        merge_opt(&mut a.lof_threshold, o.lof_threshold);
        merge_opt(&mut a.window_size, o.window_size);
        merge_opt(&mut a.seed, o.seed);
        merge_opt(&mut a.parallel, o.parallel);

        let (c, o) = (&mut base.correlation, &other.correlation);
        merge_opt(&mut c.significance_level, o.significance_level);
        merge_opt(&mut c.confidence_level, o.confidence_level);
        merge_opt(&mut c.parallel, o.parallel);
    }

    /// Apply environment variable overrides.
    /// Pattern: `VITALSTAT_ANOMALY_NUM_TREES`, `VITALSTAT_CORRELATION_SIGNIFICANCE_LEVEL`, etc.
    fn apply_env_overrides(config: &mut VitalstatConfig) {
        env_override("VITALSTAT_ANOMALY_ZSCORE_THRESHOLD", &mut config.anomaly.zscore_threshold);
        env_override("VITALSTAT_ANOMALY_NUM_TREES", &mut config.anomaly.num_trees);
        env_override("VITALSTAT_ANOMALY_CONTAMINATION", &mut config.anomaly.contamination);
        env_override("VITALSTAT_ANOMALY_MAX_SAMPLES", &mut config.anomaly.max_samples);
        env_override("VITALSTAT_ANOMALY_LOF_NEIGHBORS", &mut config.anomaly.lof_neighbors);
        env_override("VITALSTAT_ANOMALY_LOF_THRESHOLD", &mut config.anomaly.lof_threshold);
        env_override("VITALSTAT_ANOMALY_WINDOW_SIZE", &mut config.anomaly.window_size);
        env_override("VITALSTAT_ANOMALY_SEED", &mut config.anomaly.seed);
        env_override("VITALSTAT_ANOMALY_PARALLEL", &mut config.anomaly.parallel);
        env_override(
            "VITALSTAT_CORRELATION_SIGNIFICANCE_LEVEL",
            &mut config.correlation.significance_level,
        );
        env_override(
            "VITALSTAT_CORRELATION_CONFIDENCE_LEVEL",
            &mut config.correlation.confidence_level,
        );
        env_override("VITALSTAT_CORRELATION_PARALLEL", &mut config.correlation.parallel);
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut VitalstatConfig, cli: &CliOverrides) {
        merge_opt(&mut config.anomaly.seed, cli.seed);
        merge_opt(&mut config.anomaly.num_trees, cli.num_trees);
        merge_opt(&mut config.anomaly.contamination, cli.contamination);
        merge_opt(&mut config.correlation.significance_level, cli.significance_level);
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

fn merge_opt<T: Copy>(base: &mut Option<T>, other: Option<T>) {
    if other.is_some() {
        *base = other;
    }
}

/// Unparseable values are skipped so a bad env var never masks file config.
fn env_override<T: std::str::FromStr>(key: &str, slot: &mut Option<T>) {
    if let Ok(val) = std::env::var(key) {
        match val.parse::<T>() {
            Ok(v) => *slot = Some(v),
            Err(_) => tracing::warn!(key, value = %val, "ignoring unparseable env override"),
        }
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::ValidationFailed {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
