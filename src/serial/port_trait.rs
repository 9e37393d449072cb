//! Trait abstractions for device discovery, opening and selection to enable testing

use async_trait::async_trait;
use std::fmt;
use tokio::io::AsyncRead;

#[cfg(test)]
use mockall::automock;

use crate::error::Result;

/// Byte stream of an open device
pub type DeviceStream = Box<dyn AsyncRead + Send + Unpin>;

/// A discoverable serial device
///
/// Two handles are equal when they name the same port, whatever their
/// description says.
#[derive(Debug, Clone)]
pub struct DeviceHandle {
    /// Port name used to open the device (e.g. `/dev/ttyUSB0`, `COM3`)
    pub port_name: String,
    /// Human-readable description, when the OS reports one
    pub description: Option<String>,
}

impl DeviceHandle {
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl PartialEq for DeviceHandle {
    fn eq(&self, other: &Self) -> bool {
        self.port_name == other.port_name
    }
}

impl Eq for DeviceHandle {}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(description) => write!(f, "{} ({})", self.port_name, description),
            None => f.write_str(&self.port_name),
        }
    }
}

/// Enumerates and opens serial devices
#[async_trait]
pub trait DeviceProvider: Send {
    /// List the devices currently attached
    async fn list(&mut self) -> Result<Vec<DeviceHandle>>;

    /// Open a device as a byte stream
    async fn open(&mut self, device: &DeviceHandle) -> Result<DeviceStream>;
}

/// Resolves which device to use when several are attached
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PortSelector: Send {
    /// Choose one of `candidates` (port names)
    ///
    /// Returns `Ok(None)` when the answer did not name a candidate.
    async fn choose(&mut self, candidates: &[String]) -> Result<Option<String>>;
}
