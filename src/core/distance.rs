use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{BoundingBox, Coordinates};

/// Earth's radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Earth's radius in miles
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Unit every distance and distance threshold is expressed in.
///
/// Thresholds are only meaningful in the unit they were configured for, so the
/// unit travels with the scoring policy instead of being implied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceUnit {
    #[serde(rename = "km", alias = "kilometers")]
    Kilometers,
    #[serde(rename = "miles", alias = "mi")]
    Miles,
}

impl DistanceUnit {
    pub fn earth_radius(self) -> f64 {
        match self {
            DistanceUnit::Kilometers => EARTH_RADIUS_KM,
            DistanceUnit::Miles => EARTH_RADIUS_MILES,
        }
    }

    /// Length of one degree of latitude in this unit
    fn per_degree(self) -> f64 {
        self.earth_radius() * std::f64::consts::PI / 180.0
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceUnit::Kilometers => write!(f, "km"),
            DistanceUnit::Miles => write!(f, "miles"),
        }
    }
}

impl FromStr for DistanceUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "km" | "kilometers" => Ok(DistanceUnit::Kilometers),
            "mi" | "miles" => Ok(DistanceUnit::Miles),
            other => Err(format!("unknown distance unit: {}", other)),
        }
    }
}

/// Calculate the Haversine great-circle distance between two points
///
/// # Arguments
/// * `a` - First point
/// * `b` - Second point
/// * `unit` - Unit of the returned distance
///
/// # Returns
/// Non-negative distance, symmetric in `a` and `b`
#[inline]
pub fn haversine_distance(a: Coordinates, b: Coordinates, unit: DistanceUnit) -> f64 {
    let lat1_rad = a.lat.to_radians();
    let lat2_rad = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);

    // Round-off can push h slightly outside [0, 1] for identical or antipodal points
    let c = 2.0 * h.clamp(0.0, 1.0).sqrt().asin();

    unit.earth_radius() * c
}

/// Calculate a bounding box around a center point
///
/// Cheaper than Haversine, used to discard far-away postings before the exact
/// distance is computed. Near the poles the box spans every longitude.
pub fn calculate_bounding_box(center: Coordinates, radius: f64, unit: DistanceUnit) -> BoundingBox {
    let lat_delta = radius / unit.per_degree();

    let cos_lat = center.lat.to_radians().cos().abs();
    let lng_delta = if cos_lat < 1e-9 {
        180.0
    } else {
        radius / (unit.per_degree() * cos_lat)
    };

    let min_lat = center.lat - lat_delta;
    let max_lat = center.lat + lat_delta;

    // A circle over a pole reaches every meridian
    let (min_lng, max_lng) = if min_lat <= -90.0 || max_lat >= 90.0 {
        (-180.0, 180.0)
    } else {
        (center.lng - lng_delta, center.lng + lng_delta)
    };

    BoundingBox {
        min_lat: min_lat.max(-90.0),
        max_lat: max_lat.min(90.0),
        min_lng,
        max_lng,
    }
}

/// Check if a point is within a bounding box
#[inline]
pub fn is_within_bounding_box(point: Coordinates, bbox: &BoundingBox) -> bool {
    if point.lat < bbox.min_lat || point.lat > bbox.max_lat {
        return false;
    }

    // Boxes crossing the antimeridian extend past +/-180
    [point.lng - 360.0, point.lng, point.lng + 360.0]
        .iter()
        .any(|lng| *lng >= bbox.min_lng && *lng <= bbox.max_lng)
}
