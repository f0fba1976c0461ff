//! Great-circle helpers used to size detour searches.
//!
//! The midpoint is a per-axis mean rather than a geodesic midpoint. At city
//! scale the difference is a few centimetres, which is well below the
//! precision of the places service.

use crate::error::RouteError;
use crate::route::Coordinate;

/// Equatorial Earth radius in meters (WGS84).
pub const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

/// Haversine distance in meters between two coordinates.
///
/// # Errors
///
/// Returns [`RouteError::InvalidInput`] if either coordinate has a
/// non-finite component.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> Result<f64, RouteError> {
    a.validate()?;
    b.validate()?;

    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `h` just past 1 for near-antipodal points.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    Ok(EARTH_RADIUS_METERS * c)
}

/// Arithmetic mean of each axis.
///
/// # Errors
///
/// Returns [`RouteError::InvalidInput`] if either coordinate has a
/// non-finite component.
pub fn midpoint(a: Coordinate, b: Coordinate) -> Result<Coordinate, RouteError> {
    a.validate()?;
    b.validate()?;
    Ok(Coordinate {
        lon: (a.lon + b.lon) / 2.0,
        lat: (a.lat + b.lat) / 2.0,
    })
}

/// A circular search region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchArea {
    pub center: Coordinate,
    pub radius_meters: f64,
}

impl SearchArea {
    /// The circle through both endpoints of a leg, centred on their midpoint.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidInput`] if either endpoint is not finite.
    pub fn around_leg(from: Coordinate, to: Coordinate) -> Result<Self, RouteError> {
        Ok(Self {
            center: midpoint(from, to)?,
            radius_meters: distance_meters(from, to)? / 2.0,
        })
    }

    /// Whether `point` lies strictly inside the circle.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidInput`] if `point` is not finite.
    pub fn contains(&self, point: Coordinate) -> Result<bool, RouteError> {
        Ok(distance_meters(self.center, point)? < self.radius_meters)
    }
}
