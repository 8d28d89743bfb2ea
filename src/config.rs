use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::analytics::threshold::{ThresholdRule, default_rules};
use crate::error::{GreenflowError, GreenflowResult};

/// Longest duration, in seconds, that `chrono::Duration` can hold
pub const MAX_DURATION_SECS: u64 = (i64::MAX / 1000) as u64;

fn seconds(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GreenflowConfig {
    pub anomaly: AnomalyConfig,
    pub alerting: AlertConfig,
    pub monitoring: MonitoringConfig,
    pub logging: LoggingConfig,
}

/// Sliding-window detector tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnomalyConfig {
    pub window_size: usize,
    pub min_window: usize,
    pub iqr_min_samples: usize,
    pub z_threshold: f64,
    pub iqr_multiplier: f64,
    pub cooldown_secs: u64,
    pub history_capacity: usize,
    /// Windows idle longer than this are dropped; `None` keeps them forever
    pub idle_window_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertConfig {
    pub cooldown_secs: u64,
    pub history_capacity: usize,
    pub rules: Vec<ThresholdRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitoringConfig {
    pub metrics_enabled: bool,
    pub persistence_queue_capacity: usize,
    /// Sweep idle windows every this many processed readings
    pub eviction_interval: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub console_output: bool,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            window_size: 60,
            min_window: 10,
            iqr_min_samples: 20,
            z_threshold: 2.8,
            iqr_multiplier: 2.5,
            cooldown_secs: 120,
            history_capacity: 500,
            idle_window_timeout_secs: Some(24 * 3600),
        }
    }
}

impl AnomalyConfig {
    pub fn cooldown(&self) -> Duration {
        seconds(self.cooldown_secs)
    }

    pub fn idle_window_timeout(&self) -> Option<Duration> {
        self.idle_window_timeout_secs.map(seconds)
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 300,
            history_capacity: 200,
            rules: default_rules(),
        }
    }
}

impl AlertConfig {
    pub fn cooldown(&self) -> Duration {
        seconds(self.cooldown_secs)
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            persistence_queue_capacity: 256,
            eviction_interval: 1000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: None,
            console_output: true,
        }
    }
}

impl GreenflowConfig {
    /// Defaults with `GREENFLOW_*` environment overrides applied
    pub fn load_from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(std::env::vars());
        config
    }

    /// Apply `GREENFLOW_*` overrides from an iterator of variables.
    ///
    /// Unparseable values are ignored. Returns the settings that changed.
    pub fn apply_overrides<I>(&mut self, vars: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut applied = HashMap::new();

        for (key, value) in vars {
            match key.as_str() {
                "GREENFLOW_LOG_LEVEL" => {
                    let level = value.to_lowercase();
                    if matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
                        self.logging.level = level;
                        applied.insert("logging.level".to_string(), value);
                    }
                }
                "GREENFLOW_Z_THRESHOLD" => {
                    if let Ok(z) = value.parse::<f64>() {
                        self.anomaly.z_threshold = z;
                        applied.insert("anomaly.z_threshold".to_string(), value);
                    }
                }
                "GREENFLOW_WINDOW_SIZE" => {
                    if let Ok(size) = value.parse::<usize>() {
                        self.anomaly.window_size = size;
                        applied.insert("anomaly.window_size".to_string(), value);
                    }
                }
                "GREENFLOW_ANOMALY_COOLDOWN_SECS" => {
                    if let Ok(secs) = value.parse::<u64>() {
                        self.anomaly.cooldown_secs = secs;
                        applied.insert("anomaly.cooldown_secs".to_string(), value);
                    }
                }
                "GREENFLOW_ALERT_COOLDOWN_SECS" => {
                    if let Ok(secs) = value.parse::<u64>() {
                        self.alerting.cooldown_secs = secs;
                        applied.insert("alerting.cooldown_secs".to_string(), value);
                    }
                }
                _ => {}
            }
        }

        applied
    }

    /// Validate the whole configuration, collecting every problem found
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        // Anomaly validation
        let anomaly = &self.anomaly;
        if anomaly.window_size == 0 {
            errors.push("Window size must be greater than zero".to_string());
        }
        if anomaly.min_window < 2 {
            errors.push("Minimum window must be at least 2 samples".to_string());
        }
        if anomaly.min_window > anomaly.window_size {
            errors.push("Minimum window cannot exceed the window size".to_string());
        }
        if !(anomaly.z_threshold.is_finite() && anomaly.z_threshold > 0.0) {
            errors.push("Z-score threshold must be a positive number".to_string());
        }
        if !(anomaly.iqr_multiplier.is_finite() && anomaly.iqr_multiplier > 0.0) {
            errors.push("IQR multiplier must be a positive number".to_string());
        }
        if anomaly.history_capacity == 0 {
            errors.push("Anomaly history capacity must be greater than zero".to_string());
        }
        if anomaly.cooldown_secs > MAX_DURATION_SECS {
            errors.push(format!(
                "Anomaly cooldown cannot exceed {} seconds",
                MAX_DURATION_SECS
            ));
        }
        if anomaly
            .idle_window_timeout_secs
            .is_some_and(|secs| secs > MAX_DURATION_SECS)
        {
            errors.push(format!(
                "Idle window timeout cannot exceed {} seconds",
                MAX_DURATION_SECS
            ));
        }

        // Alerting validation
        if self.alerting.history_capacity == 0 {
            errors.push("Alert history capacity must be greater than zero".to_string());
        }
        if self.alerting.cooldown_secs > MAX_DURATION_SECS {
            errors.push(format!(
                "Alert cooldown cannot exceed {} seconds",
                MAX_DURATION_SECS
            ));
        }
        for rule in &self.alerting.rules {
            if let Err(e) = rule.validate() {
                errors.push(e.to_string());
            }
        }

        // Monitoring validation
        if self.monitoring.persistence_queue_capacity == 0 {
            errors.push("Persistence queue capacity must be greater than zero".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Load configuration from file path by extension (toml/json)
pub fn load_config_from_path(path: &Path) -> GreenflowResult<GreenflowConfig> {
    let content = std::fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    let config = match ext.as_str() {
        "toml" => toml::from_str::<GreenflowConfig>(&content)?,
        "json" => serde_json::from_str::<GreenflowConfig>(&content)?,
        _ => {
            return Err(GreenflowError::Config(format!(
                "Unsupported config extension: {}",
                ext
            )));
        }
    };

    config
        .validate()
        .map_err(|errors| GreenflowError::Config(errors.join(", ")))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = GreenflowConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.anomaly.window_size, 60);
        assert_eq!(config.alerting.cooldown_secs, 300);
        assert_eq!(config.alerting.rules.len(), 5);
    }

    #[test]
    fn test_overrides_ignore_garbage() {
        let mut config = GreenflowConfig::default();
        let applied = config.apply_overrides(vec![
            ("GREENFLOW_Z_THRESHOLD".to_string(), "3.5".to_string()),
            ("GREENFLOW_WINDOW_SIZE".to_string(), "lots".to_string()),
            ("GREENFLOW_LOG_LEVEL".to_string(), "DEBUG".to_string()),
            ("HOME".to_string(), "/root".to_string()),
        ]);
        assert_eq!(config.anomaly.z_threshold, 3.5);
        assert_eq!(config.anomaly.window_size, 60);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(applied.len(), 2);
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut config = GreenflowConfig::default();
        config.anomaly.window_size = 5;
        config.anomaly.z_threshold = -1.0;
        config.alerting.rules[0].high = config.alerting.rules[0].medium;
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_unrepresentable_durations_are_rejected() {
        let mut config = GreenflowConfig::default();
        config.anomaly.cooldown_secs = 10_000_000_000_000_000;
        config.anomaly.idle_window_timeout_secs = Some(u64::MAX);
        config.alerting.cooldown_secs = MAX_DURATION_SECS + 1;
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("Anomaly cooldown"));

        // accessors clamp instead of panicking
        assert_eq!(config.anomaly.cooldown(), Duration::MAX);
        assert_eq!(config.anomaly.idle_window_timeout(), Some(Duration::MAX));

        config.anomaly.cooldown_secs = MAX_DURATION_SECS;
        config.anomaly.idle_window_timeout_secs = None;
        config.alerting.cooldown_secs = 0;
        assert!(config.validate().is_ok());
        assert_eq!(config.anomaly.cooldown().num_seconds(), MAX_DURATION_SECS as i64);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: GreenflowConfig = toml::from_str(
            r#"
            [anomaly]
            z_threshold = 3.0

            [alerting]
            cooldown_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.anomaly.z_threshold, 3.0);
        assert_eq!(config.anomaly.window_size, 60);
        assert_eq!(config.alerting.cooldown_secs, 60);
        assert_eq!(config.alerting.rules, default_rules());
    }
}
