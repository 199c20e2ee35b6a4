//! Map rendering seam.

use serde::Serialize;

use crate::config::TileSource;
use crate::error::RenderError;
use crate::models::Coordinate;

pub type MarkerId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// Distinguished marker for the searched or device location
    QueryLocation,
    Place,
}

/// A marker placement with its HTML-safe popup payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub kind: MarkerKind,
    pub lat: f64,
    pub lng: f64,
    pub popup: String,
}

impl Marker {
    pub fn new(kind: MarkerKind, at: Coordinate, popup: String) -> Self {
        Self {
            kind,
            lat: at.lat(),
            lng: at.lng(),
            popup,
        }
    }
}

/// The external map library: one persistent map instance.
pub trait MapSurface {
    fn set_view(&mut self, center: Coordinate, zoom: u8) -> Result<(), RenderError>;

    /// Replace the active tile layer
    fn set_tile_source(&mut self, source: &TileSource) -> Result<(), RenderError>;

    fn add_marker(&mut self, marker: &Marker) -> Result<MarkerId, RenderError>;

    fn remove_marker(&mut self, id: MarkerId);

    /// Show a textual error in place of the map
    fn show_error(&mut self, message: &str);
}
