//! Multi-board configuration
//!
//! Tolerances and timing of the facade. Every field has a default, so a
//! partial JSON document only overrides what it names.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::MultiError;

/// Facade configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiConfig {
    /// Largest accepted difference between requested and achieved sample rate (S/s)
    pub rate_tolerance_sps: f64,
    /// Largest accepted difference between requested and achieved frequency (Hz)
    pub freq_tolerance_hz: f64,
    /// How long board 0 may go without a PPS edge (s)
    pub pps_timeout_secs: f64,
    /// Pause between PPS polls (ms)
    pub pps_poll_interval_ms: u64,
    /// Wait after arming before verifying (s)
    pub settle_secs: f64,
    /// How far ahead of board 0 another board may be after sync (s)
    pub sync_bound_secs: f64,
}

impl Default for MultiConfig {
    fn default() -> Self {
        Self {
            rate_tolerance_sps: 1.0,
            freq_tolerance_hz: 1.0,
            pps_timeout_secs: 1.1,
            pps_poll_interval_ms: 1,
            settle_secs: 1.0,
            sync_bound_secs: 0.01,
        }
    }
}

impl MultiConfig {
    /// Parse a configuration from JSON
    pub fn from_json_str(json: &str) -> Result<Self, MultiError> {
        serde_json::from_str(json)
            .map_err(|e| MultiError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MultiError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            MultiError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Save the configuration as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), MultiError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    MultiError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| MultiError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, json)
            .map_err(|e| MultiError::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// PPS wait bound
    pub fn pps_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.pps_timeout_secs.max(0.0))
    }

    /// Pause between PPS polls
    pub fn pps_poll_interval(&self) -> Duration {
        Duration::from_millis(self.pps_poll_interval_ms)
    }

    /// Post-arm settle time
    pub fn settle(&self) -> Duration {
        Duration::from_secs_f64(self.settle_secs.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MultiConfig::default();
        assert_eq!(config.rate_tolerance_sps, 1.0);
        assert_eq!(config.freq_tolerance_hz, 1.0);
        assert_eq!(config.pps_timeout(), Duration::from_millis(1100));
        assert_eq!(config.settle(), Duration::from_secs(1));
        assert_eq!(config.sync_bound_secs, 0.01);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = MultiConfig::from_json_str(r#"{ "rate_tolerance_sps": 5.0 }"#).unwrap();
        assert_eq!(config.rate_tolerance_sps, 5.0);
        assert_eq!(config.freq_tolerance_hz, 1.0);
        assert_eq!(config.pps_poll_interval_ms, 1);
    }

    #[test]
    fn test_bad_json() {
        let err = MultiConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, MultiError::Config(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("sdr-multi-config-{}", std::process::id()));
        let path = dir.join("multi.json");

        let config = MultiConfig {
            settle_secs: 2.0,
            sync_bound_secs: 0.005,
            ..Default::default()
        };
        config.save(&path).unwrap();
        let loaded = MultiConfig::load(&path).unwrap();
        assert_eq!(loaded, config);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_missing_file() {
        let err = MultiConfig::load("/nonexistent/sdr-multi.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
