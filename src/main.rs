//! # GPS Range Logger
//!
//! Log the distance and bearing between a local and a remote GPS unit
//! reported over a serial link.

use anyhow::{Context, Result};
use tracing::info;

use gps_range_logger::config::Config;
use gps_range_logger::connection::{ConnectionManager, ManagerSettings};
use gps_range_logger::serial::{ConsolePortSelector, SerialDeviceProvider};
use gps_range_logger::telemetry::LogSink;

/// Main entry point for GPS Range Logger
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration (first argument, or built-in defaults)
///    - Pick a fresh data log file (`data.log`, `data1.log`, ...)
///
/// 2. **Main Loop**
///    - Discover the serial device, asking which one to use if several are attached
///    - Log every coordinate, control message and computed distance
///    - Reconnect to the same device when it is unplugged and plugged back in
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if:
/// - The configuration file cannot be loaded
/// - Serial ports cannot be enumerated at all
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/gps.toml
/// ```
///
/// Expected output:
/// ```text
/// INFO gps_range_logger: GPS Range Logger v0.1.0 starting...
/// INFO gps_range_logger: Logging to ./data.log
/// INFO gps_range_logger::connection::manager: Serial port open (/dev/ttyUSB0)
/// INFO gps_range_logger::telemetry::logger: Remote coordinates:47.6062,-122.3321
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("GPS Range Logger v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("failed to load configuration from {}", path))?,
        None => Config::default(),
    };

    let sink = LogSink::from_config(&config.log);
    info!("Logging to {}", sink.path().display());

    let selector = ConsolePortSelector::stdio().context("failed to start console input")?;

    let mut manager = ConnectionManager::new(
        SerialDeviceProvider::new(config.serial.baud_rate),
        selector,
        sink,
        ManagerSettings::from(&config),
    );

    info!("Press Ctrl+C to exit");

    tokio::select! {
        result = manager.run() => {
            result.context("serial device discovery failed")?;
        }

        // Handle Ctrl+C for graceful shutdown
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    Ok(())
}
