//! Feature database access through the Overpass API.

mod client;
mod query;

pub use client::{parse_response, FeatureSource, OverpassClient};
pub use query::build_around_query;
