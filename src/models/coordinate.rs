//! Validated geographic coordinate.

use serde::{Deserialize, Serialize};

use crate::error::{FinderError, Result};

/// WGS84 latitude/longitude pair in degrees.
///
/// Always finite and within `[-90, 90]` x `[-180, 180]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedCoordinate")]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

/// Wire shape of a coordinate before range validation
#[derive(Deserialize)]
struct UncheckedCoordinate {
    lat: f64,
    lng: f64,
}

impl TryFrom<UncheckedCoordinate> for Coordinate {
    type Error = FinderError;

    fn try_from(raw: UncheckedCoordinate) -> Result<Self> {
        Coordinate::new(raw.lat, raw.lng)
    }
}

impl Coordinate {
    /// Validate and build a coordinate
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        if !lat.is_finite()
            || !lng.is_finite()
            || !(-90.0..=90.0).contains(&lat)
            || !(-180.0..=180.0).contains(&lng)
        {
            return Err(FinderError::InvalidCoordinate { lat, lng });
        }
        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// `"lat, lng"` with four decimals, used wherever a coordinate stands in
    /// for an address.
    pub fn format_fixed(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lng)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format_fixed())
    }
}

impl From<Coordinate> for geo::Point<f64> {
    fn from(c: Coordinate) -> Self {
        geo::Point::new(c.lng, c.lat)
    }
}
