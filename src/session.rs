//! Lookup session.
//!
//! A `Session` owns everything the pipeline shares between queries: the
//! active result set, the single map controller and the query generation
//! counter. Every query bumps the generation; work started for an older
//! generation (enrichment steps, list patches, late feature responses)
//! checks it and becomes a no-op instead of touching newer results.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

use crate::config::Config;
use crate::enrich::{pending_lookups, run_sequence, EnrichmentReport};
use crate::error::{FinderError, Result};
use crate::map::{MapController, MapSummary, MapSurface, DEVICE_LOCATION_LABEL};
use crate::models::{Coordinate, Place};
use crate::nominatim::{ForwardGeocoder, ReverseGeocoder};
use crate::normalize::{normalize, CategoryRule};
use crate::overpass::FeatureSource;
use crate::present::{ListEntry, ResultList};

/// The places of one query together with their rendered list
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub generation: u64,
    pub query: Option<Coordinate>,
    pub query_label: String,
    pub places: Vec<Place>,
    pub list: ResultList,
    pub queried_at: Option<DateTime<Utc>>,
}

/// Handle for the background phase of one query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryTicket {
    pub generation: u64,
    pub query: Coordinate,
}

/// What the first, immediate phase of a query produced
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub ticket: QueryTicket,
    pub list: ResultList,
    /// `None` when the map could not be drawn
    pub map: Option<MapSummary>,
    /// Places still showing a provisional location
    pub pending_lookups: usize,
}

impl SearchOutcome {
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

pub struct Session<F, G, M> {
    features: F,
    geocoder: G,
    rules: Vec<CategoryRule>,
    radius_m: u32,
    generation: AtomicU64,
    current: Mutex<ResultSet>,
    map: tokio::sync::Mutex<MapController<M>>,
}

impl<F, G, M> Session<F, G, M>
where
    F: FeatureSource,
    G: ForwardGeocoder + ReverseGeocoder,
    M: MapSurface,
{
    pub fn new(
        features: F,
        geocoder: G,
        map: MapController<M>,
        rules: Vec<CategoryRule>,
        config: &Config,
    ) -> Self {
        Self {
            features,
            geocoder,
            rules,
            radius_m: config.search.radius_m,
            generation: AtomicU64::new(0),
            current: Mutex::new(ResultSet::default()),
            map: tokio::sync::Mutex::new(map),
        }
    }

    fn current(&self) -> MutexGuard<'_, ResultSet> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Snapshot of the active result set
    pub fn results(&self) -> ResultSet {
        self.current().clone()
    }

    /// Lock the map controller, e.g. to forward tile events or read the surface
    pub async fn map(&self) -> tokio::sync::MutexGuard<'_, MapController<M>> {
        self.map.lock().await
    }

    /// Search near a typed place name.
    pub async fn search_text(&self, text: &str) -> Result<SearchOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(FinderError::EmptyQuery);
        }

        info!("Geocoding '{}'", text);
        let hit = self
            .geocoder
            .geocode(text)
            .await
            .ok_or(FinderError::NotFound)?;

        info!("'{}' resolved to {} ({})", text, hit.coordinate, hit.display_name);
        self.show_at(hit.coordinate, &hit.display_name).await
    }

    /// Search near the device position. `None` means location access failed.
    pub async fn search_device(&self, position: Option<(f64, f64)>) -> Result<SearchOutcome> {
        let (lat, lng) = position.ok_or(FinderError::PermissionDenied)?;

        let query = match Coordinate::new(lat, lng) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid coordinates: {}, {}", lat, lng);
                if let Err(render) = self.map.lock().await.show_invalid_location().await {
                    warn!("Could not show map error: {}", render);
                }
                return Err(e);
            }
        };

        info!("Device location: {}", query);
        self.show_at(query, DEVICE_LOCATION_LABEL).await
    }

    /// Immediate phase: fetch, normalize, list and map, with provisional
    /// addresses. Returns the ticket for [`Session::enrich`].
    pub async fn show_at(&self, query: Coordinate, query_label: &str) -> Result<SearchOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let features = self.features.fetch_nearby(query, self.radius_m).await;
        if !self.is_current(generation) {
            info!("Discarding results of superseded query {}", generation);
            return Err(FinderError::Superseded);
        }

        let places = normalize(&features, &self.rules);
        let list = ResultList::build(query, &places);
        let pending = pending_lookups(&places).len();

        info!(
            "Query {}: {} places near {} ({} awaiting addresses)",
            generation,
            places.len(),
            query,
            pending
        );

        let map_places = places.clone();
        *self.current() = ResultSet {
            generation,
            query: Some(query),
            query_label: query_label.to_string(),
            places,
            list: list.clone(),
            queried_at: Some(Utc::now()),
        };

        let map = match self
            .map
            .lock()
            .await
            .show_results(query, query_label, &map_places)
            .await
        {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!("Map could not be drawn: {}", e);
                None
            }
        };

        Ok(SearchOutcome {
            ticket: QueryTicket { generation, query },
            list,
            map,
            pending_lookups: pending,
        })
    }

    /// Background phase: resolve missing addresses one by one, patching the
    /// list entry of each place as its address arrives. Map popups are redrawn
    /// once the sequence finishes.
    ///
    /// A ticket from a superseded query does nothing.
    pub async fn enrich<P>(&self, ticket: QueryTicket, mut on_patch: P) -> EnrichmentReport
    where
        P: FnMut(&ListEntry),
    {
        let targets = {
            let current = self.current();
            if current.generation != ticket.generation {
                return EnrichmentReport {
                    stale: true,
                    ..Default::default()
                };
            }
            pending_lookups(&current.places)
        };

        let report = run_sequence(
            &targets,
            &self.geocoder,
            || self.is_current(ticket.generation),
            |index, address| {
                let mut guard = self.current();
                let ResultSet {
                    generation,
                    places,
                    list,
                    ..
                } = &mut *guard;

                if *generation != ticket.generation {
                    return false;
                }
                let Some(place) = places.get_mut(index) else {
                    return false;
                };
                if place.needs_address_lookup {
                    place.set_address(address);
                    if let Some(entry) = list.patch(index, place) {
                        on_patch(entry);
                    }
                }
                true
            },
        )
        .await;

        if report.applied() > 0 && !report.stale {
            self.redraw_markers(ticket.generation).await;
        }
        report
    }

    /// Rebuild the markers of `generation` so popups carry enriched addresses
    async fn redraw_markers(&self, generation: u64) {
        let (query, label, places) = {
            let current = self.current();
            match current.query {
                Some(query) if current.generation == generation => {
                    (query, current.query_label.clone(), current.places.clone())
                }
                _ => return,
            }
        };

        let mut map = self.map.lock().await;
        if !self.is_current(generation) {
            return;
        }
        if let Err(e) = map.show_results(query, &label, &places).await {
            warn!("Could not refresh map markers: {}", e);
        }
    }
}
