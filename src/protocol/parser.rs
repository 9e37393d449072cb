//! # Telemetry Line Parser
//!
//! Classifies one text line of the telemetry protocol.

use crate::error::{Result, TelemetryError};
use crate::geodesy::Coordinate;

/// Prefix of a line reporting the remote unit's fix
pub const REMOTE_PREFIX: &str = "REMOTE:";

/// Prefix of a line reporting the local unit's fix
pub const LOCAL_PREFIX: &str = "LOCAL:";

/// Prefix of a computed-distance line echoed back by the device
pub const DISTANCE_ECHO_PREFIX: &str = "Distance:";

/// A coordinate together with the text it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub coordinate: Coordinate,
    /// `<lat>,<long>` exactly as the device reported the two fields
    pub text: String,
}

/// A classified protocol line
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryLine {
    Remote(Position),
    Local(Position),
    Control(String),
}

/// Parse one line (without its line terminator)
///
/// # Returns
///
/// * `Ok(Some(line))` - A coordinate report or control message
/// * `Ok(None)` - Blank line or echoed `Distance:` line, nothing to report
///
/// # Errors
///
/// Returns [`TelemetryError::Protocol`] if a `REMOTE:`/`LOCAL:` line does not
/// carry exactly two numeric fields within latitude/longitude range.
///
/// # Examples
///
/// ```
/// use gps_range_logger::protocol::{parse_line, TelemetryLine};
///
/// match parse_line("REMOTE:1.0,2.0")? {
///     Some(TelemetryLine::Remote(pos)) => assert_eq!(pos.coordinate.longitude, 2.0),
///     other => panic!("unexpected {:?}", other),
/// }
/// assert_eq!(parse_line("Distance: 5 meters")?, None);
/// # Ok::<(), gps_range_logger::error::TelemetryError>(())
/// ```
pub fn parse_line(line: &str) -> Result<Option<TelemetryLine>> {
    if line.trim().is_empty() {
        return Ok(None);
    }

    if let Some(rest) = line.strip_prefix(REMOTE_PREFIX) {
        return parse_position(rest).map(|p| Some(TelemetryLine::Remote(p)));
    }

    if let Some(rest) = line.strip_prefix(LOCAL_PREFIX) {
        return parse_position(rest).map(|p| Some(TelemetryLine::Local(p)));
    }

    if line.starts_with(DISTANCE_ECHO_PREFIX) {
        return Ok(None);
    }

    Ok(Some(TelemetryLine::Control(line.to_string())))
}

fn parse_position(fields: &str) -> Result<Position> {
    let mut parts = fields.split(',');
    let (lat_text, long_text) = match (parts.next(), parts.next(), parts.next()) {
        (Some(lat), Some(long), None) => (lat.trim(), long.trim()),
        _ => {
            return Err(TelemetryError::Protocol(format!(
                "expected <lat>,<long>, got {:?}",
                fields
            )))
        }
    };

    let latitude = parse_degrees(lat_text, "latitude", 90.0)?;
    let longitude = parse_degrees(long_text, "longitude", 180.0)?;

    Ok(Position {
        coordinate: Coordinate::new(latitude, longitude),
        text: format!("{},{}", lat_text, long_text),
    })
}

fn parse_degrees(text: &str, axis: &str, limit: f64) -> Result<f64> {
    let value: f64 = text
        .parse()
        .map_err(|_| TelemetryError::Protocol(format!("invalid {}: {:?}", axis, text)))?;

    if !value.is_finite() || value.abs() > limit {
        return Err(TelemetryError::Protocol(format!(
            "{} out of range: {}",
            axis, text
        )));
    }

    Ok(value)
}
