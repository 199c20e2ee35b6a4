//! Great-circle distance between coordinates.

use crate::models::Coordinate;

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two coordinates in kilometers.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat().to_radians();
    let lat2 = b.lat().to_radians();
    let dlat = (b.lat() - a.lat()).to_radians();
    let dlng = (b.lng() - a.lng()).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Distance with two decimals, e.g. "1.23 km"
pub fn format_km(km: f64) -> String {
    format!("{:.2} km", km)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn test_identical_points() {
        let p = c(48.8566, 2.3522);
        assert_eq!(haversine_km(p, p), 0.0);
    }

    #[test]
    fn test_one_degree_longitude_at_equator() {
        let d = haversine_km(c(0.0, 0.0), c(0.0, 1.0));
        assert!((d - 111.19).abs() < 0.01, "got {}", d);
    }

    #[test]
    fn test_symmetric() {
        let a = c(40.7128, -74.0060);
        let b = c(34.0522, -118.2437);
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
    }

    #[test]
    fn test_antipodal() {
        let d = haversine_km(c(0.0, 0.0), c(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_format_km() {
        assert_eq!(format_km(1.234), "1.23 km");
        assert_eq!(format_km(0.0), "0.00 km");
    }
}
