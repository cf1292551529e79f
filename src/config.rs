//! Configuration for the login behavior sensor.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gap thresholds used while capturing
    pub thresholds: Thresholds,

    /// Logical key name counted as a backward delete
    pub backspace_key: String,

    /// Capacity of each subscription's event queue
    pub channel_capacity: usize,

    /// Host metric fallbacks and overrides
    pub environment: EnvironmentConfig,

    /// Authentication endpoint settings
    pub transport: TransportConfig,
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content).map_err(ConfigError::Parse)?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("login-behavior-sensor")
            .join("config.json")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            backspace_key: "Backspace".to_string(),
            channel_capacity: 10_000,
            environment: EnvironmentConfig::default(),
            transport: TransportConfig::default(),
        }
    }
}

/// Gap thresholds, in milliseconds.
///
/// The two thresholds are independent: idle time looks at gaps between any
/// two actions, pauses only at gaps between pointer movements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Gaps strictly longer than this between any two actions count as idle time
    pub idle_threshold_ms: f64,
    /// Gaps strictly longer than this between pointer movements count as a pause
    pub pause_threshold_ms: f64,
}

/// Default idle threshold.
pub const IDLE_THRESHOLD_MS: f64 = 300.0;

/// Default pause threshold.
pub const PAUSE_THRESHOLD_MS: f64 = 250.0;

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            idle_threshold_ms: IDLE_THRESHOLD_MS,
            pause_threshold_ms: PAUSE_THRESHOLD_MS,
        }
    }
}

/// Host metrics used when the process cannot observe them directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub viewport_width: Option<u32>,
    pub viewport_height: Option<u32>,
    pub device_pixel_ratio: Option<f64>,
    /// IANA timezone name overriding the local timezone
    pub timezone: Option<String>,
}

/// Authentication endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Base URL the login path is appended to
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(serde_json::Error),

    #[error("Serialize error: {0}")]
    Serialize(serde_json::Error),
}
