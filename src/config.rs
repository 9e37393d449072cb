//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, TelemetryError};

/// Baud rates accepted for the telemetry link
const SUPPORTED_BAUD_RATES: &[u32] = &[9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Port chosen without prompting when several devices are present
    #[serde(default)]
    pub preferred_port: String,
}

/// Discovery and reconnection timing
#[derive(Debug, Deserialize, Clone)]
pub struct ConnectionConfig {
    #[serde(default = "default_discovery_interval_ms")]
    pub discovery_interval_ms: u64,

    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

/// Data log configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,

    #[serde(default = "default_file_stem")]
    pub file_stem: String,

    #[serde(default = "default_extension")]
    pub extension: String,

    /// chrono strftime pattern, rendered in local time
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

/// Telemetry session configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_reset_on_reconnect")]
    pub reset_on_reconnect: bool,
}

// Default value functions
fn default_baud_rate() -> u32 { 115200 }

fn default_discovery_interval_ms() -> u64 { 1000 }
fn default_retry_attempts() -> u32 { 10 }
fn default_retry_delay_ms() -> u64 { 500 }

fn default_log_dir() -> String { ".".to_string() }
fn default_file_stem() -> String { "data".to_string() }
fn default_extension() -> String { "log".to_string() }
fn default_timestamp_format() -> String { "%-m/%-d/%Y, %-I:%M:%S %p".to_string() }

fn default_reset_on_reconnect() -> bool { true }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: default_baud_rate(),
            preferred_port: String::new(),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            discovery_interval_ms: default_discovery_interval_ms(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            file_stem: default_file_stem(),
            extension: default_extension(),
            timestamp_format: default_timestamp_format(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reset_on_reconnect: default_reset_on_reconnect(),
        }
    }
}

impl ConnectionConfig {
    pub fn discovery_interval(&self) -> Duration {
        Duration::from_millis(self.discovery_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl SerialConfig {
    /// Preferred port, if one is configured
    pub fn preferred_port(&self) -> Option<&str> {
        let port = self.preferred_port.trim();
        (!port.is_empty()).then_some(port)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing sections and keys fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gps_range_logger::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid(format!(
                "baud_rate must be one of: {:?}",
                SUPPORTED_BAUD_RATES
            )));
        }

        if self.connection.discovery_interval_ms == 0
            || self.connection.discovery_interval_ms > 60000
        {
            return Err(invalid("discovery_interval_ms must be between 1 and 60000"));
        }

        if self.connection.retry_attempts == 0 {
            return Err(invalid("retry_attempts must be greater than 0"));
        }

        if self.connection.retry_delay_ms > 60000 {
            return Err(invalid("retry_delay_ms must be between 0 and 60000"));
        }

        if self.log.file_stem.trim().is_empty() {
            return Err(invalid("log file_stem cannot be empty"));
        }

        if self.log.extension.trim().is_empty() || self.log.extension.contains('.') {
            return Err(invalid("log extension must be non-empty and without dots"));
        }

        if self.log.timestamp_format.is_empty() {
            return Err(invalid("log timestamp_format cannot be empty"));
        }

        Ok(())
    }
}

fn invalid(msg: impl std::fmt::Display) -> TelemetryError {
    TelemetryError::Config(toml::de::Error::custom(msg))
}
