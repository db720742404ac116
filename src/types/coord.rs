use serde::{Deserialize, Serialize};

use crate::error::PlacementError;

/// A point on the globe. Latitude and longitude are in degrees, altitude in meters.
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoCoordinate {
    lat: f64,
    #[serde(rename = "lon")]
    long: f64,
    #[serde(default)]
    altitude: f64,
}

impl GeoCoordinate {
    pub const fn new(lat: f64, long: f64) -> Self {
        Self {
            lat,
            long,
            altitude: 0.0,
        }
    }

    pub const fn with_altitude(lat: f64, long: f64, altitude: f64) -> Self {
        Self {
            lat,
            long,
            altitude,
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn long(&self) -> f64 {
        self.long
    }

    pub fn altitude(&self) -> f64 {
        self.altitude
    }

    pub fn to_tuple(&self) -> (f64, f64) {
        (self.lat, self.long)
    }

    /// Checks the coordinate lies on the globe. NaN and infinities are rejected too.
    pub fn validate(&self) -> Result<(), PlacementError> {
        let lat_ok = (-90.0..=90.0).contains(&self.lat);
        let long_ok = (-180.0..=180.0).contains(&self.long);
        if lat_ok && long_ok && self.altitude.is_finite() {
            Ok(())
        } else {
            Err(PlacementError::InvalidCoordinate {
                lat: self.lat,
                long: self.long,
            })
        }
    }
}

impl From<(f64, f64)> for GeoCoordinate {
    fn from((lat, long): (f64, f64)) -> Self {
        GeoCoordinate::new(lat, long)
    }
}

/// A coordinate on the projected plane, plus how many projection units one meter spans there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub scale_factor: f64,
}
