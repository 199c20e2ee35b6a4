//! Background address enrichment.
//!
//! Places normalized without an address get one from reverse geocoding after
//! the list and map are already on screen. Lookups run strictly one after
//! another in input order; the geocoder paces its own requests.

use serde::Serialize;
use tracing::{debug, info};

use crate::models::{Coordinate, Place};
use crate::nominatim::ReverseGeocoder;

/// How an enriched address was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Resolution {
    /// Reverse geocoding returned an address
    Geocoded,
    /// Lookup failed; the coordinate stands in
    Coordinate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentReport {
    pub geocoded: usize,
    pub fallback: usize,
    /// The query was superseded before the sequence finished
    pub stale: bool,
}

impl EnrichmentReport {
    pub fn applied(&self) -> usize {
        self.geocoded + self.fallback
    }
}

/// A place awaiting an address, by index into its result set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookupTarget {
    pub index: usize,
    pub coordinate: Coordinate,
}

/// Places of `places` that still need a lookup, in input order
pub fn pending_lookups(places: &[Place]) -> Vec<LookupTarget> {
    places
        .iter()
        .enumerate()
        .filter(|(_, p)| p.needs_address_lookup)
        .map(|(index, p)| LookupTarget {
            index,
            coordinate: p.coordinate,
        })
        .collect()
}

/// Address for a lookup outcome: the geocoder's answer, else `"lat, lng"`.
pub fn address_or_fallback(coordinate: Coordinate, outcome: Option<String>) -> (String, Resolution) {
    match outcome {
        Some(address) if !address.trim().is_empty() => (address, Resolution::Geocoded),
        _ => (coordinate.format_fixed(), Resolution::Coordinate),
    }
}

/// Resolve every target serially.
///
/// `is_current` is checked before each request. `apply` hands a result back to
/// the owner of the places and returns `false` if the owner has moved on, in
/// which case the result is dropped and the sequence stops.
pub async fn run_sequence<R, C, A>(
    targets: &[LookupTarget],
    geocoder: &R,
    is_current: C,
    mut apply: A,
) -> EnrichmentReport
where
    R: ReverseGeocoder,
    C: Fn() -> bool,
    A: FnMut(usize, String) -> bool,
{
    let mut report = EnrichmentReport::default();

    for target in targets {
        if !is_current() {
            debug!("Enrichment superseded before place {}", target.index);
            report.stale = true;
            break;
        }

        let outcome = geocoder.reverse(target.coordinate).await;
        let (address, resolution) = address_or_fallback(target.coordinate, outcome);

        if !apply(target.index, address) {
            debug!("Dropping address for place {}: query superseded", target.index);
            report.stale = true;
            break;
        }

        match resolution {
            Resolution::Geocoded => report.geocoded += 1,
            Resolution::Coordinate => report.fallback += 1,
        }
    }

    info!(
        "Enrichment finished: {} geocoded, {} coordinate fallbacks{}",
        report.geocoded,
        report.fallback,
        if report.stale { " (superseded)" } else { "" }
    );

    report
}
