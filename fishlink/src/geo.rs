//! Great-circle distance between farm and restaurant coordinates.
//!
//! [`haversine_km`] is the raw formula on a sphere of radius
//! [`EARTH_RADIUS_KM`]. It performs no range validation: callers either
//! supply valid signed decimal degrees or omit coordinates entirely.
//!
//! Coordinates are optional on every entity, so the typed entry point is
//! [`Coordinates::from_parts`], which only yields a value when *both*
//! latitude and longitude are present.
//!
//! ```
//! use fishlink::geo::{Coordinates, haversine_km};
//!
//! assert_eq!(haversine_km(35.0, 139.0, 35.0, 139.0), 0.0);
//! assert!(Coordinates::from_parts(Some(35.0), None).is_none());
//! ```

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometers between two points given in decimal degrees.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lng2 - lng1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    // rounding can push `a` just past 1 for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// A fully known latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in signed decimal degrees.
    pub lat: f64,
    /// Longitude in signed decimal degrees.
    pub lng: f64,
}

impl Coordinates {
    /// Create a coordinate pair.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Combine optional entity columns; `None` if either part is missing.
    pub fn from_parts(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        Some(Self::new(lat?, lng?))
    }

    /// Great-circle distance to `other` in kilometers.
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        haversine_km(self.lat, self.lng, other.lat, other.lng)
    }
}
