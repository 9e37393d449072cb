//! # Connection Manager
//!
//! Drives [`ConnectionState`] against real collaborators: a device provider,
//! a port selector and an event sink. The manager owns the telemetry session
//! and the sink, so every event is produced and persisted from one task.

use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::state::{ConnectionEvent, ConnectionState, RetryPolicy, StateKind};
use crate::config::Config;
use crate::error::{Result, TelemetryError};
use crate::protocol::LineSplitter;
use crate::serial::{DeviceHandle, DeviceProvider, DeviceStream, PortSelector};
use crate::telemetry::{EventSink, TelemetrySession};

/// Serial read buffer size
const READ_CHUNK_SIZE: usize = 1024;

/// Timing and policy knobs for the manager
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    pub retry: RetryPolicy,
    /// Wait between scans while no device is attached
    pub discovery_interval: Duration,
    /// Wait before each reconnection poll
    pub retry_delay: Duration,
    /// Clear session coordinates whenever a device is opened
    pub reset_on_reconnect: bool,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            discovery_interval: Duration::from_secs(1),
            retry_delay: Duration::from_millis(500),
            reset_on_reconnect: true,
        }
    }
}

impl From<&Config> for ManagerSettings {
    fn from(config: &Config) -> Self {
        Self {
            retry: RetryPolicy {
                max_attempts: config.connection.retry_attempts,
                preferred_port: config.serial.preferred_port().map(str::to_string),
            },
            discovery_interval: config.connection.discovery_interval(),
            retry_delay: config.connection.retry_delay(),
            reset_on_reconnect: config.session.reset_on_reconnect,
        }
    }
}

/// Connection supervisor
///
/// Call [`run`](Self::run) to supervise forever, or [`step`](Self::step) to
/// perform the work of exactly one state.
pub struct ConnectionManager<P, S, E> {
    provider: P,
    selector: S,
    sink: E,
    session: TelemetrySession,
    settings: ManagerSettings,
    state: ConnectionState,
    stream: Option<DeviceStream>,
    /// "No available ports" already reported for this stay in Discovering
    idle_reported: bool,
}

impl<P, S, E> ConnectionManager<P, S, E>
where
    P: DeviceProvider,
    S: PortSelector,
    E: EventSink,
{
    pub fn new(provider: P, selector: S, sink: E, settings: ManagerSettings) -> Self {
        Self {
            provider,
            selector,
            sink,
            session: TelemetrySession::new(),
            settings,
            state: ConnectionState::Discovering,
            stream: None,
            idle_reported: false,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn session(&self) -> &TelemetrySession {
        &self.session
    }

    /// Supervise the connection until a fatal error occurs
    ///
    /// Recoverable failures in any state are logged and restart discovery.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error, i.e. device enumeration failing outright
    pub async fn run(&mut self) -> Result<()> {
        loop {
            if let Err(e) = self.step().await {
                if e.is_fatal() {
                    error!("{}", e);
                    return Err(e);
                }
                error!("Unexpected error: {}", e);
                self.stream = None;
                self.state = ConnectionState::Discovering;
                sleep(self.settings.discovery_interval).await;
            }
        }
    }

    /// Do the work of the current state and apply the resulting transition
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Discovery`] if enumeration fails while
    /// discovering, or any selector failure. The state is left at
    /// `Discovering` after an error.
    pub async fn step(&mut self) -> Result<()> {
        let state = std::mem::replace(&mut self.state, ConnectionState::Discovering);

        let event = match &state {
            ConnectionState::Discovering => self.discover().await?,
            ConnectionState::AwaitingSelection { candidates } => self.select(candidates).await?,
            ConnectionState::Opening { device } => self.open(device).await,
            ConnectionState::Open { device } => self.pump(device).await,
            ConnectionState::Closed { device } => {
                warn!("Serial port closed ({})", device.port_name);
                ConnectionEvent::BeginRetry
            }
            ConnectionState::Retrying { device, attempt } => self.poll(device, *attempt).await,
        };

        let from = state.kind();
        self.state = state.next(event, &self.settings.retry);
        let to = self.state.kind();

        if from != to {
            debug!("Connection {} -> {}", from, to);
        }
        if to != StateKind::Discovering {
            self.idle_reported = false;
        }

        Ok(())
    }

    async fn discover(&mut self) -> Result<ConnectionEvent> {
        let devices = self.provider.list().await?;

        match devices.len() {
            0 => {
                if !self.idle_reported {
                    info!("No available ports found. Waiting for device to connect...");
                    self.idle_reported = true;
                }
                sleep(self.settings.discovery_interval).await;
            }
            1 => debug!("Single device found: {}", devices[0]),
            n => {
                info!("{} serial ports found", n);
                for device in &devices {
                    info!("  {}", device);
                }
            }
        }

        Ok(ConnectionEvent::Discovered(devices))
    }

    async fn select(&mut self, candidates: &[DeviceHandle]) -> Result<ConnectionEvent> {
        let names: Vec<String> = candidates.iter().map(|d| d.port_name.clone()).collect();

        let chosen = self
            .selector
            .choose(&names)
            .await?
            .and_then(|name| candidates.iter().find(|d| d.port_name == name).cloned());

        Ok(match chosen {
            Some(device) => {
                info!("Selected {}", device);
                ConnectionEvent::Selected(device)
            }
            None => {
                debug!("Selection did not name a candidate, prompting again");
                ConnectionEvent::InvalidSelection
            }
        })
    }

    async fn open(&mut self, device: &DeviceHandle) -> ConnectionEvent {
        match self.provider.open(device).await {
            Ok(stream) => {
                info!("Serial port open ({})", device.port_name);
                self.stream = Some(stream);
                if self.settings.reset_on_reconnect {
                    self.session.reset();
                }
                ConnectionEvent::Opened
            }
            Err(e) => {
                warn!("Error opening port: {}", e);
                ConnectionEvent::OpenFailed
            }
        }
    }

    /// Deliver lines from the open stream until it ends
    async fn pump(&mut self, device: &DeviceHandle) -> ConnectionEvent {
        let Some(mut stream) = self.stream.take() else {
            warn!("No stream for {}", device.port_name);
            return ConnectionEvent::StreamClosed;
        };

        let mut splitter = LineSplitter::new();
        let mut buf = [0u8; READ_CHUNK_SIZE];

        loop {
            match stream.read(&mut buf).await {
                Ok(0) => {
                    debug!("End of stream on {}", device.port_name);
                    break;
                }
                Ok(n) => {
                    for line in splitter.push(&buf[..n]) {
                        self.dispatch(&line);
                    }
                }
                Err(e) => {
                    warn!("{}", TelemetryError::StreamClosed(e.to_string()));
                    break;
                }
            }
        }

        if let Some(line) = splitter.finish() {
            self.dispatch(&line);
        }

        ConnectionEvent::StreamClosed
    }

    async fn poll(&mut self, device: &DeviceHandle, attempt: u32) -> ConnectionEvent {
        sleep(self.settings.retry_delay).await;

        let present = match self.provider.list().await {
            Ok(devices) => devices.contains(device),
            Err(e) => {
                debug!("Enumeration failed while waiting for {}: {}", device.port_name, e);
                false
            }
        };

        debug!(
            "Reconnect poll {}/{}: {} {}",
            attempt + 1,
            self.settings.retry.max_attempts,
            device.port_name,
            if present { "present" } else { "absent" }
        );

        ConnectionEvent::RetryPoll { present }
    }

    fn dispatch(&mut self, line: &str) {
        for event in self.session.handle_line(line) {
            self.sink.append(event);
        }
    }
}
