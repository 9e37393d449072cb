//! # Geodesy
//!
//! Great-circle distance and coarse compass bearing between two GPS fixes.
//!
//! Distances use the haversine formula on a spherical Earth (mean radius
//! 6,371 km). The bearing is intentionally coarse: it is derived from the raw
//! latitude/longitude deltas rather than from a great-circle initial course,
//! and is quantized to one of eight compass points.

use std::f64::consts::PI;
use std::fmt;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Degrees to radians conversion factor.
const DEG_TO_RAD: f64 = PI / 180.0;

/// Angular width of one compass sector (45 degrees)
const SECTOR_RAD: f64 = 2.0 * PI / 8.0;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Eight-point compass direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bearing {
    East,
    Northeast,
    North,
    Northwest,
    West,
    Southwest,
    South,
    Southeast,
}

impl Bearing {
    /// Sectors indexed counter-clockwise starting at East
    const SECTORS: [Bearing; 8] = [
        Bearing::East,
        Bearing::Northeast,
        Bearing::North,
        Bearing::Northwest,
        Bearing::West,
        Bearing::Southwest,
        Bearing::South,
        Bearing::Southeast,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bearing::East => "East",
            Bearing::Northeast => "Northeast",
            Bearing::North => "North",
            Bearing::Northwest => "Northwest",
            Bearing::West => "West",
            Bearing::Southwest => "Southwest",
            Bearing::South => "South",
            Bearing::Southeast => "Southeast",
        }
    }
}

impl fmt::Display for Bearing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Haversine distance between two coordinates, rounded to the nearest meter
///
/// # Examples
///
/// ```
/// use gps_range_logger::geodesy::{distance_meters, Coordinate};
///
/// // One degree of latitude along a meridian
/// let d = distance_meters(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
/// assert_eq!(d, 111_195);
/// ```
pub fn distance_meters(a: Coordinate, b: Coordinate) -> u64 {
    let lat1_rad = a.latitude * DEG_TO_RAD;
    let lat2_rad = b.latitude * DEG_TO_RAD;
    let delta_lat = (b.latitude - a.latitude) * DEG_TO_RAD;
    let delta_lon = (b.longitude - a.longitude) * DEG_TO_RAD;

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Guard against h drifting a hair above 1.0 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();

    (EARTH_RADIUS_M * c).round() as u64
}

/// Compass direction of a raw `(delta_lat, delta_long)` vector
///
/// The angle `atan2(delta_lat, delta_long)` is divided into 45 degree sectors
/// and rounded half away from zero, so an angle exactly on a sector boundary
/// (22.5, 67.5, ... degrees) resolves to the sector further from East. A zero
/// vector yields [`Bearing::East`].
pub fn bearing(delta_lat: f64, delta_long: f64) -> Bearing {
    Bearing::SECTORS[compass_sector(delta_lat.atan2(delta_long))]
}

fn compass_sector(angle_rad: f64) -> usize {
    let sector = (angle_rad / SECTOR_RAD).round() as i64;
    sector.rem_euclid(8) as usize
}
