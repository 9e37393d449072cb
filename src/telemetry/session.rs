//! # Telemetry Session
//!
//! Tracks the latest remote and local fixes for one open connection and
//! turns protocol lines into log events.

use super::event::LogEvent;
use crate::geodesy::{bearing, distance_meters};
use crate::protocol::{parse_line, Position, TelemetryLine};

/// Latest fixes from the two GPS units
///
/// A distance is computed on every `LOCAL:` line once both a remote and a
/// local fix have been received in this session.
#[derive(Debug, Default, Clone)]
pub struct TelemetrySession {
    remote: Option<Position>,
    local: Option<Position>,
}

impl TelemetrySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget both fixes
    pub fn reset(&mut self) {
        self.remote = None;
        self.local = None;
    }

    pub fn remote(&self) -> Option<&Position> {
        self.remote.as_ref()
    }

    pub fn local(&self) -> Option<&Position> {
        self.local.as_ref()
    }

    /// Parse and apply one raw protocol line
    ///
    /// Malformed coordinate lines produce a single warning event and leave
    /// the session untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use gps_range_logger::telemetry::TelemetrySession;
    ///
    /// let mut session = TelemetrySession::new();
    /// assert_eq!(session.handle_line("REMOTE:10.0,20.0").len(), 1);
    /// let events = session.handle_line("LOCAL:10.001,20.001");
    /// assert_eq!(events[1].message, "Computed distance: 156 meters Southwest");
    /// ```
    pub fn handle_line(&mut self, line: &str) -> Vec<LogEvent> {
        match parse_line(line) {
            Ok(Some(parsed)) => self.apply(parsed),
            Ok(None) => Vec::new(),
            Err(e) => vec![LogEvent::warning(format!("Dropped malformed line {:?}: {}", line, e))],
        }
    }

    /// Apply an already classified line
    pub fn apply(&mut self, line: TelemetryLine) -> Vec<LogEvent> {
        match line {
            TelemetryLine::Remote(position) => {
                let event = LogEvent::info(format!("Remote coordinates:{}", position.text));
                self.remote = Some(position);
                vec![event]
            }
            TelemetryLine::Local(position) => {
                let mut events =
                    vec![LogEvent::info(format!("Local coordinates:{}", position.text))];
                self.local = Some(position);
                if let Some(event) = self.range_event() {
                    events.push(event);
                }
                events
            }
            TelemetryLine::Control(text) => {
                vec![LogEvent::info(format!("Control message: {}", text))]
            }
        }
    }

    fn range_event(&self) -> Option<LogEvent> {
        let remote = self.remote.as_ref()?.coordinate;
        let local = self.local.as_ref()?.coordinate;

        let direction = bearing(
            remote.latitude - local.latitude,
            remote.longitude - local.longitude,
        );
        let meters = distance_meters(local, remote);

        Some(LogEvent::info(format!(
            "Computed distance: {} meters {}",
            meters, direction
        )))
    }
}
