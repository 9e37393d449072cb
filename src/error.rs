//! # Error Types
//!
//! Custom error types for GPS Range Logger using `thiserror`.

use thiserror::Error;

/// Main error type for GPS Range Logger
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Serial device enumeration failed. No recovery path exists.
    #[error("Device discovery failed: {0}")]
    Discovery(String),

    /// Device busy or unavailable
    #[error("Failed to open {device}: {reason}")]
    Open { device: String, reason: String },

    /// Device disappeared or the byte stream failed
    #[error("Serial stream closed: {0}")]
    StreamClosed(String),

    /// Malformed coordinate line
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Data log append failed
    #[error("Error writing to log file: {0}")]
    SinkWrite(#[source] std::io::Error),

    /// Port selection could not be obtained
    #[error("Port selection failed: {0}")]
    Selection(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TelemetryError {
    /// Whether the error must terminate the process instead of restarting discovery
    pub fn is_fatal(&self) -> bool {
        matches!(self, TelemetryError::Discovery(_) | TelemetryError::Config(_))
    }
}

/// Result type alias for GPS Range Logger
pub type Result<T> = std::result::Result<T, TelemetryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_discovery_and_config_are_fatal() {
        assert!(TelemetryError::Discovery("no backend".into()).is_fatal());
        assert!(!TelemetryError::StreamClosed("unplugged".into()).is_fatal());
        assert!(!TelemetryError::Protocol("missing comma".into()).is_fatal());
        assert!(!TelemetryError::Selection("stdin closed".into()).is_fatal());
        assert!(!TelemetryError::Open {
            device: "/dev/ttyUSB0".into(),
            reason: "busy".into()
        }
        .is_fatal());
    }

    #[test]
    fn test_open_error_message() {
        let err = TelemetryError::Open {
            device: "/dev/ttyUSB0".into(),
            reason: "Device or resource busy".into(),
        };
        assert_eq!(err.to_string(), "Failed to open /dev/ttyUSB0: Device or resource busy");
    }
}
