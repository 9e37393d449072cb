//! # Connection State Machine
//!
//! Pure transition function for device discovery, selection, open/close and
//! bounded reconnection. No I/O happens here; the manager performs the work
//! of each state and reports the outcome as a [`ConnectionEvent`].

use std::fmt;

use crate::serial::DeviceHandle;

/// Bounds for reconnecting to a device that went away
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Enumeration polls before falling back to full discovery
    pub max_attempts: u32,
    /// Port chosen without prompting when several devices are present
    pub preferred_port: Option<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            preferred_port: None,
        }
    }
}

/// Connection lifecycle state
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    /// Enumerating attached devices
    Discovering,
    /// Several devices found, waiting for the port selector
    AwaitingSelection { candidates: Vec<DeviceHandle> },
    /// Opening the chosen device
    Opening { device: DeviceHandle },
    /// Byte stream active, lines are being delivered
    Open { device: DeviceHandle },
    /// Stream ended
    Closed { device: DeviceHandle },
    /// Polling for the remembered device to come back
    Retrying { device: DeviceHandle, attempt: u32 },
}

/// Field-less view of [`ConnectionState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Discovering,
    AwaitingSelection,
    Opening,
    Open,
    Closed,
    Retrying,
}

/// Outcome of the work done in a state
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// Enumeration finished with these devices
    Discovered(Vec<DeviceHandle>),
    /// The port selector named a candidate
    Selected(DeviceHandle),
    /// The port selector answer matched no candidate
    InvalidSelection,
    /// Device opened
    Opened,
    /// Device busy or unavailable
    OpenFailed,
    /// Stream ended or failed
    StreamClosed,
    /// Close handled, start polling for the device
    BeginRetry,
    /// One reconnection poll finished
    RetryPoll { present: bool },
    /// Unexpected failure; restart from discovery
    Fault,
}

impl ConnectionState {
    pub fn kind(&self) -> StateKind {
        match self {
            ConnectionState::Discovering => StateKind::Discovering,
            ConnectionState::AwaitingSelection { .. } => StateKind::AwaitingSelection,
            ConnectionState::Opening { .. } => StateKind::Opening,
            ConnectionState::Open { .. } => StateKind::Open,
            ConnectionState::Closed { .. } => StateKind::Closed,
            ConnectionState::Retrying { .. } => StateKind::Retrying,
        }
    }

    /// Device this state refers to, if any
    pub fn device(&self) -> Option<&DeviceHandle> {
        match self {
            ConnectionState::Opening { device }
            | ConnectionState::Open { device }
            | ConnectionState::Closed { device }
            | ConnectionState::Retrying { device, .. } => Some(device),
            ConnectionState::Discovering | ConnectionState::AwaitingSelection { .. } => None,
        }
    }

    /// Apply one event
    ///
    /// Events that do not apply to the current state leave it unchanged,
    /// except [`ConnectionEvent::Fault`] which always restarts discovery.
    ///
    /// # Examples
    ///
    /// ```
    /// use gps_range_logger::connection::{ConnectionEvent, ConnectionState, RetryPolicy};
    /// use gps_range_logger::serial::DeviceHandle;
    ///
    /// let policy = RetryPolicy::default();
    /// let usb0 = DeviceHandle::new("/dev/ttyUSB0");
    ///
    /// let state = ConnectionState::Discovering
    ///     .next(ConnectionEvent::Discovered(vec![usb0.clone()]), &policy);
    /// assert_eq!(state, ConnectionState::Opening { device: usb0 });
    /// ```
    pub fn next(self, event: ConnectionEvent, policy: &RetryPolicy) -> ConnectionState {
        use ConnectionEvent as E;
        use ConnectionState as S;

        match (self, event) {
            (_, E::Fault) => S::Discovering,

            (S::Discovering, E::Discovered(mut devices)) => match devices.len() {
                0 => S::Discovering,
                1 => S::Opening {
                    device: devices.remove(0),
                },
                _ => match preferred(&devices, policy) {
                    Some(device) => S::Opening { device },
                    None => S::AwaitingSelection {
                        candidates: devices,
                    },
                },
            },

            (S::AwaitingSelection { .. }, E::Selected(device)) => S::Opening { device },
            (state @ S::AwaitingSelection { .. }, E::InvalidSelection) => state,

            (S::Opening { device }, E::Opened) => S::Open { device },
            (S::Opening { device }, E::OpenFailed) => S::Retrying { device, attempt: 0 },

            (S::Open { device }, E::StreamClosed) => S::Closed { device },

            (S::Closed { device }, E::BeginRetry) => S::Retrying { device, attempt: 0 },

            (S::Retrying { device, .. }, E::RetryPoll { present: true }) => S::Opening { device },
            (S::Retrying { device, attempt }, E::RetryPoll { present: false }) => {
                let attempt = attempt + 1;
                if attempt >= policy.max_attempts {
                    S::Discovering
                } else {
                    S::Retrying { device, attempt }
                }
            }

            (state, _) => state,
        }
    }
}

fn preferred(devices: &[DeviceHandle], policy: &RetryPolicy) -> Option<DeviceHandle> {
    let name = policy.preferred_port.as_deref()?;
    devices.iter().find(|d| d.port_name == name).cloned()
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StateKind::Discovering => "discovering",
            StateKind::AwaitingSelection => "awaiting selection",
            StateKind::Opening => "opening",
            StateKind::Open => "open",
            StateKind::Closed => "closed",
            StateKind::Retrying => "retrying",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev(name: &str) -> DeviceHandle {
        DeviceHandle::new(name)
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            preferred_port: None,
        }
    }

    #[test]
    fn test_no_devices_stays_discovering() {
        let state =
            ConnectionState::Discovering.next(ConnectionEvent::Discovered(vec![]), &policy(10));
        assert_eq!(state, ConnectionState::Discovering);
    }

    #[test]
    fn test_single_device_is_auto_selected() {
        let state = ConnectionState::Discovering
            .next(ConnectionEvent::Discovered(vec![dev("COM3")]), &policy(10));
        assert_eq!(state, ConnectionState::Opening { device: dev("COM3") });
    }

    #[test]
    fn test_several_devices_need_selection() {
        let devices = vec![dev("/dev/ttyUSB0"), dev("/dev/ttyUSB1")];
        let state = ConnectionState::Discovering
            .next(ConnectionEvent::Discovered(devices.clone()), &policy(10));
        assert_eq!(state, ConnectionState::AwaitingSelection { candidates: devices });
    }

    #[test]
    fn test_preferred_port_skips_selection() {
        let policy = RetryPolicy {
            max_attempts: 10,
            preferred_port: Some("/dev/ttyUSB1".to_string()),
        };
        let state = ConnectionState::Discovering.next(
            ConnectionEvent::Discovered(vec![dev("/dev/ttyUSB0"), dev("/dev/ttyUSB1")]),
            &policy,
        );
        assert_eq!(state, ConnectionState::Opening { device: dev("/dev/ttyUSB1") });
    }

    #[test]
    fn test_absent_preferred_port_falls_back_to_selection() {
        let policy = RetryPolicy {
            max_attempts: 10,
            preferred_port: Some("/dev/ttyACM0".to_string()),
        };
        let state = ConnectionState::Discovering.next(
            ConnectionEvent::Discovered(vec![dev("/dev/ttyUSB0"), dev("/dev/ttyUSB1")]),
            &policy,
        );
        assert_eq!(state.kind(), StateKind::AwaitingSelection);
    }

    #[test]
    fn test_selection() {
        let waiting = ConnectionState::AwaitingSelection {
            candidates: vec![dev("a"), dev("b")],
        };
        assert_eq!(
            waiting.clone().next(ConnectionEvent::InvalidSelection, &policy(10)),
            waiting
        );
        assert_eq!(
            waiting.next(ConnectionEvent::Selected(dev("b")), &policy(10)),
            ConnectionState::Opening { device: dev("b") }
        );
    }

    #[test]
    fn test_open_success_and_failure() {
        let opening = ConnectionState::Opening { device: dev("a") };
        assert_eq!(
            opening.clone().next(ConnectionEvent::Opened, &policy(10)),
            ConnectionState::Open { device: dev("a") }
        );
        assert_eq!(
            opening.next(ConnectionEvent::OpenFailed, &policy(10)),
            ConnectionState::Retrying { device: dev("a"), attempt: 0 }
        );
    }

    #[test]
    fn test_close_leads_to_retrying() {
        let state = ConnectionState::Open { device: dev("a") }
            .next(ConnectionEvent::StreamClosed, &policy(10));
        assert_eq!(state, ConnectionState::Closed { device: dev("a") });

        let state = state.next(ConnectionEvent::BeginRetry, &policy(10));
        assert_eq!(state, ConnectionState::Retrying { device: dev("a"), attempt: 0 });
    }

    #[test]
    fn test_retry_reopens_remembered_device() {
        let state = ConnectionState::Retrying { device: dev("a"), attempt: 4 }
            .next(ConnectionEvent::RetryPoll { present: true }, &policy(10));
        assert_eq!(state, ConnectionState::Opening { device: dev("a") });
    }

    #[test]
    fn test_retry_bound_exhaustion_restarts_discovery() {
        let policy = policy(3);
        let mut state = ConnectionState::Retrying { device: dev("a"), attempt: 0 };
        let mut visited = Vec::new();
        for _ in 0..3 {
            state = state.next(ConnectionEvent::RetryPoll { present: false }, &policy);
            visited.push(state.clone());
        }
        assert_eq!(
            visited,
            vec![
                ConnectionState::Retrying { device: dev("a"), attempt: 1 },
                ConnectionState::Retrying { device: dev("a"), attempt: 2 },
                ConnectionState::Discovering,
            ]
        );
    }

    #[test]
    fn test_fault_always_restarts_discovery() {
        let states = [
            ConnectionState::Discovering,
            ConnectionState::AwaitingSelection { candidates: vec![dev("a"), dev("b")] },
            ConnectionState::Opening { device: dev("a") },
            ConnectionState::Open { device: dev("a") },
            ConnectionState::Closed { device: dev("a") },
            ConnectionState::Retrying { device: dev("a"), attempt: 2 },
        ];
        for state in states {
            assert_eq!(
                state.next(ConnectionEvent::Fault, &policy(10)),
                ConnectionState::Discovering
            );
        }
    }

    #[test]
    fn test_unrelated_event_is_ignored() {
        let open = ConnectionState::Open { device: dev("a") };
        assert_eq!(open.clone().next(ConnectionEvent::Opened, &policy(10)), open);
        assert_eq!(
            ConnectionState::Discovering.next(ConnectionEvent::StreamClosed, &policy(10)),
            ConnectionState::Discovering
        );
    }

    #[test]
    fn test_device_accessor() {
        assert_eq!(ConnectionState::Discovering.device(), None);
        assert_eq!(
            ConnectionState::Closed { device: dev("a") }.device(),
            Some(&dev("a"))
        );
    }
}
