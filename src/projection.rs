//! Spherical Web Mercator (EPSG:3857), the map surface's native projection.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::models::GeoPoint;

pub const EARTH_RADIUS: f64 = 6_378_137.0;
/// Half the width of the projected world, in meters.
pub const HALF_SIZE: f64 = PI * EARTH_RADIUS;

/// A point in map units (meters, EPSG:3857).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
}

/// Converts provider coordinates to map units.
///
/// Callers must only pass points satisfying [`GeoPoint::is_valid`]; the
/// provider client filters anything else out before it reaches here.
pub fn project(point: GeoPoint) -> ProjectedPoint {
    debug_assert!(point.is_valid(), "coordinate out of range: {point:?}");

    let x = EARTH_RADIUS * point.longitude.to_radians();
    let y = EARTH_RADIUS * (PI / 4.0 + point.latitude.to_radians() / 2.0).tan().ln();

    ProjectedPoint {
        x,
        y: y.clamp(-HALF_SIZE, HALF_SIZE),
    }
}

pub fn unproject(point: ProjectedPoint) -> GeoPoint {
    let longitude = (point.x / EARTH_RADIUS).to_degrees();
    let latitude = (2.0 * (point.y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    GeoPoint { longitude, latitude }
}
