//! Geocoding through Nominatim.

mod address;
mod client;
mod pacer;

pub use address::{format_reverse_address, AddressDetails, ReverseResponse};
pub use client::{ForwardGeocoder, GeocodeHit, NominatimClient, ReverseGeocoder};
pub use pacer::Pacer;
