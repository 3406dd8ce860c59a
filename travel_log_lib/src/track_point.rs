use chrono::{DateTime, Utc};
use geo_types::Coord;
use serde::{Deserialize, Serialize};

/// One location reading as reported by the device.
///
/// Coordinates are taken as given. Range and NaN checks belong to whatever
/// produces the sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub latitude: f64,
    pub longitude: f64,
    /// Instantaneous speed in meters per second, if the provider reports one.
    #[serde(default, rename = "speed", skip_serializing_if = "Option::is_none")]
    pub speed_mps: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl PositionSample {
    pub fn new(latitude: f64, longitude: f64, speed_mps: Option<f64>, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            speed_mps,
            timestamp,
        }
    }

    pub fn point(&self) -> PathPoint {
        PathPoint::new(self.latitude, self.longitude)
    }
}

/// A point on a recorded path. Serialized as `{ "lat": .., "lng": .. }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub lat: f64,
    pub lng: f64,
}

impl PathPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<PathPoint> for Coord {
    fn from(point: PathPoint) -> Self {
        Coord { x: point.lng, y: point.lat }
    }
}

impl From<Coord> for PathPoint {
    fn from(coord: Coord) -> Self {
        PathPoint::new(coord.y, coord.x)
    }
}

impl From<&PositionSample> for PathPoint {
    fn from(sample: &PositionSample) -> Self {
        sample.point()
    }
}
