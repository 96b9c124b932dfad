//! Great-circle distance for proximity ranking.
//!
//! # Invariants
//! - Inputs are decimal degrees; no range validation happens here.
//! - Results are symmetric and zero for identical points.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Distance in kilometres to `other`.
    pub fn distance_km_to(&self, other: &GeoPoint) -> f64 {
        distance_km(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Haversine distance in kilometres between two coordinates.
///
/// Never panics. Out-of-range coordinates produce a mathematically defined
/// value, and NaN inputs propagate as NaN.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let half_chord = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push the term slightly outside [0, 1] for antipodal input.
    let half_chord = half_chord.clamp(0.0, 1.0);
    let central_angle = 2.0 * half_chord.sqrt().atan2((1.0 - half_chord).sqrt());
    EARTH_RADIUS_KM * central_angle
}

#[cfg(test)]
mod tests {
    use super::{distance_km, GeoPoint};

    const LISBON: GeoPoint = GeoPoint {
        lat: 38.7223,
        lng: -9.1393,
    };
    const PORTO: GeoPoint = GeoPoint {
        lat: 41.1579,
        lng: -8.6291,
    };

    #[test]
    fn lisbon_to_porto_is_within_expected_band() {
        let distance = LISBON.distance_km_to(&PORTO);
        assert!(distance > 270.0 && distance < 320.0, "got {distance}");
    }

    #[test]
    fn same_point_is_zero() {
        for point in [LISBON, PORTO, GeoPoint::new(0.0, 0.0), GeoPoint::new(-89.9, 179.9)] {
            assert!(point.distance_km_to(&point).abs() < 0.01);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (LISBON, PORTO),
            (GeoPoint::new(37.0179, -7.9351), GeoPoint::new(41.551, -8.4271)),
            (GeoPoint::new(10.0, 170.0), GeoPoint::new(-10.0, -170.0)),
        ];
        for (a, b) in pairs {
            assert!((a.distance_km_to(&b) - b.distance_km_to(&a)).abs() < 1e-9);
        }
    }

    #[test]
    fn out_of_range_input_does_not_panic() {
        let distance = distance_km(200.0, 400.0, -300.0, -720.0);
        assert!(distance.is_finite());
        assert!(distance >= 0.0);
        assert!(distance_km(f64::NAN, 0.0, 0.0, 0.0).is_nan());
    }

    #[test]
    fn antipodal_points_are_half_circumference() {
        let distance = distance_km(0.0, 0.0, 0.0, 180.0);
        let expected = std::f64::consts::PI * super::EARTH_RADIUS_KM;
        assert!((distance - expected).abs() < 0.01);
    }
}
