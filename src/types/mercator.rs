//! Forward Web Mercator projection into the map's normalized world space.
//!
//! The world is a unit square: x runs 0..1 west to east, y runs 0..1 north to
//! south. Altitude is expressed in the same units, scaled by the circumference
//! at the coordinate's latitude.

use std::f64::consts::PI;

use crate::error::PlacementError;

use super::{GeoCoordinate, ProjectedPoint};

/// Mean earth radius in meters used by the map renderer.
pub const EARTH_RADIUS: f64 = 6371008.8;

pub const EARTH_CIRCUMFERENCE: f64 = 2.0 * PI * EARTH_RADIUS;

pub fn mercator_x_from_long(long: f64) -> f64 {
    (180.0 + long) / 360.0
}

pub fn mercator_y_from_lat(lat: f64) -> f64 {
    (180.0 - (180.0 / PI) * (PI / 4.0 + lat * PI / 360.0).tan().ln()) / 360.0
}

pub fn circumference_at_latitude(lat: f64) -> f64 {
    EARTH_CIRCUMFERENCE * (lat * PI / 180.0).cos()
}

pub fn mercator_z_from_altitude(altitude: f64, lat: f64) -> f64 {
    altitude / circumference_at_latitude(lat)
}

/// Projection units per real-world meter at the given latitude.
pub fn meter_in_mercator_units(lat: f64) -> f64 {
    1.0 / EARTH_CIRCUMFERENCE / (lat * PI / 180.0).cos()
}

/// Projects a coordinate onto the Mercator plane.
///
/// This is meant to be called once per placement. The result is baked into the
/// entity's `ModelTransform` and reused every frame.
pub fn project(coord: GeoCoordinate) -> Result<ProjectedPoint, PlacementError> {
    coord.validate()?;

    Ok(ProjectedPoint {
        x: mercator_x_from_long(coord.long()),
        y: mercator_y_from_lat(coord.lat()),
        z: mercator_z_from_altitude(coord.altitude(), coord.lat()),
        scale_factor: meter_in_mercator_units(coord.lat()),
    })
}
