//! Reclaim - find recycling centers and scrap yards near a place.
//!
//! A query (a place name or a device position) is geocoded, nearby features
//! are fetched from OpenStreetMap through Overpass, normalized into places,
//! listed by distance and drawn on a map. Places without an address are then
//! reverse geocoded one at a time and patched into the list as results come
//! in.

pub mod config;
pub mod distance;
pub mod enrich;
pub mod error;
pub mod map;
pub mod models;
pub mod nominatim;
pub mod normalize;
pub mod overpass;
pub mod present;
pub mod session;
mod templates;

pub use error::{FinderError, RenderError};
pub use models::{Category, Coordinate, Place, RawFeature};
pub use session::{QueryTicket, ResultSet, SearchOutcome, Session};
