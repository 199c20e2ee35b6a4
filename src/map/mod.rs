//! Map view: one persistent map, markers per result set, tile fallback.

mod controller;
mod html;
mod surface;
mod tiles;

pub use controller::{
    MapController, MapLoader, MapSummary, Popup, DEVICE_LOCATION_LABEL, INVALID_LOCATION,
    MAP_LOAD_FAILED, TILES_FAILED,
};
pub use html::HtmlMap;
pub use surface::{MapSurface, Marker, MarkerId, MarkerKind};
pub use tiles::{TileEvent, TileFallback};
