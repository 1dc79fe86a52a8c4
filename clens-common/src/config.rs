//! Bootstrap configuration loaded from TOML
//!
//! Resolution priority for the configuration file:
//! 1. Command-line argument (highest priority)
//! 2. `CLENS_CONFIG` environment variable
//! 3. `<config_dir>/clens/config.toml`
//! 4. Compiled defaults (no file)
//!
//! A missing file is not an error: a warning is logged and defaults are used.
//! A file that exists but fails to parse or validate is a configuration error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CLENS_CONFIG";

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub perception: PerceptionSettings,
    #[serde(default)]
    pub reasoning: ReasoningSettings,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Perception pipeline tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionSettings {
    /// Detection confidence threshold for the primary pass
    pub baseline_threshold: f64,
    /// Lowered threshold used by the hybrid fallback pass
    pub fallback_threshold: f64,
    /// Primary yields below this count trigger the hybrid fallback
    pub min_detections: usize,
    /// Wall-clock budget for a whole scan
    pub deadline_ms: u64,
    /// Maximum registry coverage sweep candidates per scan
    pub sweep_limit: usize,
    /// Detections are kept if `confidence >= threshold * threshold_slack`
    pub threshold_slack: f64,
    /// Recall hypotheses must exceed this confidence to be rescanned
    pub rescan_acceptance: f64,
}

impl Default for PerceptionSettings {
    fn default() -> Self {
        Self {
            baseline_threshold: 0.20,
            fallback_threshold: 0.12,
            min_detections: 6,
            deadline_ms: 4000,
            sweep_limit: 3,
            threshold_slack: 0.8,
            rescan_acceptance: 0.35,
        }
    }
}

impl PerceptionSettings {
    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let in_unit = |v: f64| v > 0.0 && v <= 1.0;

        if !in_unit(self.baseline_threshold) {
            return Err(Error::Config(format!(
                "perception.baseline_threshold must be in (0, 1], got {}",
                self.baseline_threshold
            )));
        }
        if !in_unit(self.fallback_threshold) || self.fallback_threshold > self.baseline_threshold {
            return Err(Error::Config(format!(
                "perception.fallback_threshold must be in (0, baseline_threshold], got {}",
                self.fallback_threshold
            )));
        }
        if !in_unit(self.threshold_slack) {
            return Err(Error::Config(format!(
                "perception.threshold_slack must be in (0, 1], got {}",
                self.threshold_slack
            )));
        }
        if !(0.0..1.0).contains(&self.rescan_acceptance) {
            return Err(Error::Config(format!(
                "perception.rescan_acceptance must be in [0, 1), got {}",
                self.rescan_acceptance
            )));
        }
        if self.deadline_ms == 0 {
            return Err(Error::Config("perception.deadline_ms must be > 0".to_string()));
        }
        if self.min_detections == 0 {
            return Err(Error::Config(
                "perception.min_detections must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// External reasoning engine connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningSettings {
    /// Endpoint accepting protocol requests; offline generation when absent
    pub endpoint: Option<String>,
    pub timeout_ms: u64,
}

impl Default for ReasoningSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: 15_000,
        }
    }
}

/// Default config file location for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("clens").join("config.toml"))
}

/// Pick the config file to load, by priority
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path()
}

/// Parse and validate a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)?;
    config.perception.validate()?;
    Ok(config)
}

/// Resolve and load configuration, falling back to defaults when no file exists
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = resolve_config_path(cli_arg) else {
        warn!("Could not determine config directory, using defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file {} not found, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let config = load_toml_config(&path)?;
    info!("Configuration loaded from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = PerceptionSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.min_detections, 6);
        assert_eq!(settings.deadline_ms, 4000);
    }

    #[test]
    fn test_fallback_above_baseline_rejected() {
        let settings = PerceptionSettings {
            fallback_threshold: 0.5,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_deadline_rejected() {
        let settings = PerceptionSettings {
            deadline_ms: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            [perception]
            deadline_ms = 2500
            "#,
        )
        .unwrap();
        assert_eq!(config.perception.deadline_ms, 2500);
        assert_eq!(config.perception.baseline_threshold, 0.20);
        assert_eq!(config.logging.level, "info");
        assert!(config.reasoning.endpoint.is_none());
    }

    #[test]
    fn test_cli_path_wins() {
        let path = PathBuf::from("/tmp/explicit.toml");
        assert_eq!(resolve_config_path(Some(&path)), Some(path));
    }
}
