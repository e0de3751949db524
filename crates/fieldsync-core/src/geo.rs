//! Coordinates and the great-circle distance helper.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in degrees. Route stops and geometry points share this type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// A route stop: identity is its position in the input sequence.
pub type Stop = Coordinate;

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True if latitude is within [-90, 90] and longitude within [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Distance to `other` in the given unit.
    pub fn distance_to(&self, other: &Coordinate, unit: DistanceUnit) -> f64 {
        great_circle_distance(self.lat, self.lon, other.lat, other.lon, unit)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}

/// Output unit for [`great_circle_distance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceUnit {
    Kilometers,
    NauticalMiles,
    /// Statute miles; the unit of the raw formula.
    #[default]
    Miles,
}

impl DistanceUnit {
    /// `"K"` is kilometers, `"N"` nautical miles, anything else statute miles.
    pub fn from_code(code: &str) -> Self {
        match code {
            "K" => DistanceUnit::Kilometers,
            "N" => DistanceUnit::NauticalMiles,
            _ => DistanceUnit::Miles,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DistanceUnit::Kilometers => "km",
            DistanceUnit::NauticalMiles => "nmi",
            DistanceUnit::Miles => "mi",
        }
    }
}

/// Spherical law of cosines distance between two points given in degrees.
///
/// The central angle in degrees is scaled by 60 * 1.1515 to statute miles,
/// then converted for `K` (× 1.609344) or `N` (× 0.8684). Identical points
/// are exactly zero.
pub fn great_circle_distance(
    lat1: f64,
    lon1: f64,
    lat2: f64,
    lon2: f64,
    unit: DistanceUnit,
) -> f64 {
    if lat1 == lat2 && lon1 == lon2 {
        return 0.0;
    }
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let delta = (lon1 - lon2).to_radians();
    // Rounding can push nearby points just above 1.0, which acos maps to NaN.
    let cos_angle = (phi1.sin() * phi2.sin() + phi1.cos() * phi2.cos() * delta.cos()).clamp(-1.0, 1.0);
    let miles = cos_angle.acos().to_degrees() * 60.0 * 1.1515;
    match unit {
        DistanceUnit::Kilometers => miles * 1.609344,
        DistanceUnit::NauticalMiles => miles * 0.8684,
        DistanceUnit::Miles => miles,
    }
}
