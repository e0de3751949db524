//! `fieldsync distance` – great-circle distance between two points.

use fieldsync_core::geo::{great_circle_distance, DistanceUnit};

pub fn run_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64, unit: &str) {
    let unit = DistanceUnit::from_code(unit);
    let d = great_circle_distance(lat1, lon1, lat2, lon2, unit);
    println!("{:.3} {}", d, unit.label());
}
