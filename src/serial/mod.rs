//! # Serial Communication Module
//!
//! Handles discovery of and connection to the GPS telemetry device.
//!
//! This module handles:
//! - Enumerating attached serial ports
//! - Opening the selected port at 115,200 baud (8N1)
//! - Asking the operator which port to use when several are attached

pub mod port_trait;
pub mod selector;

pub use port_trait::{DeviceHandle, DeviceProvider, DeviceStream, PortSelector};
pub use selector::ConsolePortSelector;

use async_trait::async_trait;
use tokio_serial::{SerialPortBuilderExt, SerialPortInfo, SerialPortType};
use tracing::debug;

use crate::error::{Result, TelemetryError};

/// Baud rate of the telemetry link (115,200 baud)
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Device provider backed by the operating system's serial ports
#[derive(Debug, Clone)]
pub struct SerialDeviceProvider {
    baud_rate: u32,
}

impl Default for SerialDeviceProvider {
    fn default() -> Self {
        Self::new(DEFAULT_BAUD_RATE)
    }
}

impl SerialDeviceProvider {
    pub fn new(baud_rate: u32) -> Self {
        Self { baud_rate }
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Open a specific serial port with telemetry link settings
    fn open_port(&self, path: &str) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, self.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| TelemetryError::Open {
                device: path.to_string(),
                reason: e.to_string(),
            })?;

        Ok(port)
    }
}

#[async_trait]
impl DeviceProvider for SerialDeviceProvider {
    async fn list(&mut self) -> Result<Vec<DeviceHandle>> {
        let ports = tokio_serial::available_ports()
            .map_err(|e| TelemetryError::Discovery(e.to_string()))?;

        let devices: Vec<DeviceHandle> = ports.into_iter().map(device_from_info).collect();
        debug!("Found {} serial port(s)", devices.len());
        Ok(devices)
    }

    async fn open(&mut self, device: &DeviceHandle) -> Result<DeviceStream> {
        debug!("Trying to open serial port: {}", device.port_name);
        let port = self.open_port(&device.port_name)?;
        Ok(Box::new(port))
    }
}

fn device_from_info(info: SerialPortInfo) -> DeviceHandle {
    let handle = DeviceHandle::new(info.port_name);
    match info.port_type {
        SerialPortType::UsbPort(usb) => {
            let description = match (usb.manufacturer, usb.product) {
                (Some(m), Some(p)) => Some(format!("{} {}", m, p)),
                (m, p) => m.or(p),
            };
            match description {
                Some(d) => handle.with_description(d),
                None => handle.with_description(format!("USB {:04x}:{:04x}", usb.vid, usb.pid)),
            }
        }
        SerialPortType::BluetoothPort => handle.with_description("Bluetooth"),
        _ => handle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_serial::UsbPortInfo;

    fn usb_info(manufacturer: Option<&str>, product: Option<&str>) -> SerialPortInfo {
        SerialPortInfo {
            port_name: "/dev/ttyUSB0".to_string(),
            port_type: SerialPortType::UsbPort(UsbPortInfo {
                vid: 0x10c4,
                pid: 0xea60,
                serial_number: None,
                manufacturer: manufacturer.map(str::to_string),
                product: product.map(str::to_string),
            }),
        }
    }

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_BAUD_RATE, 115_200);
        assert_eq!(SerialDeviceProvider::default().baud_rate(), 115_200);
    }

    #[test]
    fn test_usb_description() {
        let device = device_from_info(usb_info(Some("Silicon Labs"), Some("CP2102")));
        assert_eq!(device.port_name, "/dev/ttyUSB0");
        assert_eq!(device.description.as_deref(), Some("Silicon Labs CP2102"));

        let device = device_from_info(usb_info(None, Some("CP2102")));
        assert_eq!(device.description.as_deref(), Some("CP2102"));

        let device = device_from_info(usb_info(None, None));
        assert_eq!(device.description.as_deref(), Some("USB 10c4:ea60"));
    }

    #[test]
    fn test_unknown_port_has_no_description() {
        let device = device_from_info(SerialPortInfo {
            port_name: "/dev/ttyS0".to_string(),
            port_type: SerialPortType::Unknown,
        });
        assert_eq!(device, DeviceHandle::new("/dev/ttyS0"));
        assert!(device.description.is_none());
    }

    #[tokio::test]
    async fn test_open_with_invalid_path_returns_error() {
        let mut provider = SerialDeviceProvider::default();
        let result = provider
            .open(&DeviceHandle::new("/dev/nonexistent_serial_device_12345"))
            .await;

        match result {
            Err(TelemetryError::Open { device, .. }) => {
                assert_eq!(device, "/dev/nonexistent_serial_device_12345");
            }
            Err(other) => panic!("Expected Open error, got: {:?}", other),
            Ok(_) => panic!("Opening a nonexistent device should fail"),
        }
    }

    // Integration test - only runs if a serial device is connected
    #[tokio::test]
    #[ignore] // Run with: cargo test -- --ignored
    async fn test_list_with_real_hardware() {
        let mut provider = SerialDeviceProvider::default();
        match provider.list().await {
            Ok(devices) => {
                for device in devices {
                    println!("Found serial device: {}", device);
                }
            }
            Err(e) => println!("Serial enumeration unavailable: {}", e),
        }
    }
}
