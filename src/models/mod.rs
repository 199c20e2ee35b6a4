//! Core data models for the finder.

pub mod coordinate;
pub mod feature;
pub mod place;

pub use coordinate::Coordinate;
pub use feature::{Center, ElementKind, RawFeature, Tags};
pub use place::{Category, Place, DEFAULT_MATERIALS};
