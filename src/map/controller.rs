//! Map view controller.
//!
//! Owns the single map instance for the lifetime of the session. The surface
//! comes from a readiness future that is awaited once, on first use; every
//! later result set recenters that same surface and swaps its markers.

use geo::{BoundingRect, MultiPoint, Point, Rect};
use minijinja::context;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, error, info, warn};

use super::surface::{MapSurface, Marker, MarkerId, MarkerKind};
use super::tiles::{TileEvent, TileFallback};
use crate::config::MapConfig;
use crate::distance::{format_km, haversine_km};
use crate::error::RenderError;
use crate::models::{Coordinate, Place};
use crate::present::address_text;
use crate::templates;

pub const MAP_LOAD_FAILED: &str = "Map could not be loaded.";
pub const TILES_FAILED: &str =
    "Map tiles could not be loaded. Please check your internet connection and try again.";
pub const INVALID_LOCATION: &str = "Invalid location coordinates.";

/// Popup label for a device-location query
pub const DEVICE_LOCATION_LABEL: &str = "Your Location";

/// Future resolving to a ready map surface
pub type MapLoader<S> = Pin<Box<dyn Future<Output = Result<S, RenderError>>>>;

enum SurfaceState<S> {
    Loading(MapLoader<S>),
    Ready(S),
    Failed(RenderError),
}

/// Fields summarised in a place marker's popup
#[derive(Debug, Clone, Serialize)]
pub struct Popup {
    pub name: String,
    pub category: String,
    /// "Address", or "Approximate location" while only the coordinate is known
    pub address_label: &'static str,
    pub address: String,
    pub materials: Vec<String>,
    pub distance: String,
}

impl Popup {
    pub fn for_place(query: Coordinate, place: &Place) -> Self {
        let (address, kind) = address_text(place);
        Self {
            name: place.name.clone(),
            category: place.category.label().to_string(),
            address_label: kind.label(),
            address,
            materials: place.materials.clone(),
            distance: format_km(haversine_km(query, place.coordinate)),
        }
    }

    pub fn to_html(&self) -> Result<String, RenderError> {
        templates::render(templates::POPUP, context! { popup => self })
    }
}

/// Outcome of drawing one result set
#[derive(Debug, Clone, PartialEq)]
pub struct MapSummary {
    /// Markers on the map, query marker included
    pub placed: usize,
    /// Markers that could not be drawn
    pub failed: usize,
    /// Extent of the placed markers
    pub extent: Option<Rect<f64>>,
}

pub struct MapController<S> {
    state: SurfaceState<S>,
    markers: Vec<MarkerId>,
    tiles: TileFallback,
    zoom: u8,
}

impl<S: MapSurface + 'static> MapController<S> {
    /// Controller whose surface becomes available when `loader` resolves
    pub fn new<F>(loader: F, config: &MapConfig) -> Self
    where
        F: Future<Output = Result<S, RenderError>> + 'static,
    {
        Self {
            state: SurfaceState::Loading(Box::pin(loader)),
            markers: Vec::new(),
            tiles: TileFallback::new(config.tile_sources.clone(), config.max_tile_errors),
            zoom: config.zoom,
        }
    }

    /// Controller around an already constructed surface
    pub fn with_surface(surface: S, config: &MapConfig) -> Self {
        Self::new(std::future::ready(Ok(surface)), config)
    }
}

impl<S: MapSurface> MapController<S> {
    /// Await the loader once, installing the primary tile source on success
    async fn ready<'a>(
        state: &'a mut SurfaceState<S>,
        tiles: &TileFallback,
    ) -> Result<&'a mut S, RenderError> {
        let pending = RenderError::NotReady("map is still loading".to_string());
        *state = match std::mem::replace(state, SurfaceState::Failed(pending)) {
            SurfaceState::Loading(loader) => match loader.await {
                Ok(mut surface) => {
                    if let Some(source) = tiles.current() {
                        info!("Using tile server: {}", source.name);
                        if let Err(e) = surface.set_tile_source(source) {
                            warn!("Could not install tile layer {}: {}", source.name, e);
                        }
                    }
                    SurfaceState::Ready(surface)
                }
                Err(e) => {
                    error!("Map initialization error: {}", e);
                    SurfaceState::Failed(e)
                }
            },
            other => other,
        };

        match state {
            SurfaceState::Ready(surface) => Ok(surface),
            SurfaceState::Failed(e) => Err(e.clone()),
            SurfaceState::Loading(_) => Err(RenderError::NotReady(
                "map is still loading".to_string(),
            )),
        }
    }

    /// The surface, if it has finished loading
    pub fn surface(&self) -> Option<&S> {
        match &self.state {
            SurfaceState::Ready(surface) => Some(surface),
            _ => None,
        }
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn tiles(&self) -> &TileFallback {
        &self.tiles
    }

    /// Recenter on `query` and replace all markers with the new result set.
    ///
    /// A marker that fails is logged and skipped; the rest still render.
    pub async fn show_results(
        &mut self,
        query: Coordinate,
        query_label: &str,
        places: &[Place],
    ) -> Result<MapSummary, RenderError> {
        let surface = Self::ready(&mut self.state, &self.tiles).await?;

        if let Err(e) = surface.set_view(query, self.zoom) {
            error!("Map initialization error: {}", e);
            surface.show_error(MAP_LOAD_FAILED);
            return Err(e);
        }

        for id in self.markers.drain(..) {
            surface.remove_marker(id);
        }

        let mut placed: Vec<Point<f64>> = Vec::with_capacity(places.len() + 1);
        let mut failed = 0;

        let query_marker = templates::render(templates::QUERY_POPUP, context! { label => query_label })
            .map(|popup| Marker::new(MarkerKind::QueryLocation, query, popup))
            .and_then(|marker| surface.add_marker(&marker));
        match query_marker {
            Ok(id) => {
                self.markers.push(id);
                placed.push(query.into());
            }
            Err(e) => {
                warn!("Could not add query location marker: {}", e);
                failed += 1;
            }
        }

        for place in places {
            let marker = Popup::for_place(query, place)
                .to_html()
                .map(|popup| Marker::new(MarkerKind::Place, place.coordinate, popup))
                .and_then(|marker| surface.add_marker(&marker));
            match marker {
                Ok(id) => {
                    self.markers.push(id);
                    placed.push(place.coordinate.into());
                }
                Err(e) => {
                    warn!("Could not add marker for place {}: {}", place.name, e);
                    failed += 1;
                }
            }
        }

        debug!("Placed {} markers ({} failed)", placed.len(), failed);

        Ok(MapSummary {
            placed: placed.len(),
            failed,
            extent: MultiPoint::from(placed).bounding_rect(),
        })
    }

    /// Replace the map with the invalid-location message
    pub async fn show_invalid_location(&mut self) -> Result<(), RenderError> {
        let surface = Self::ready(&mut self.state, &self.tiles).await?;
        surface.show_error(INVALID_LOCATION);
        Ok(())
    }

    /// Tile load failure reported by the surface
    pub fn tile_error(&mut self) {
        let event = self.tiles.on_error();
        let SurfaceState::Ready(surface) = &mut self.state else {
            return;
        };
        match event {
            TileEvent::Unchanged => {}
            TileEvent::Switched(source) => {
                if let Err(e) = surface.set_tile_source(&source) {
                    warn!("Could not install tile layer {}: {}", source.name, e);
                }
            }
            TileEvent::Exhausted => surface.show_error(TILES_FAILED),
        }
    }

    /// Tile load success reported by the surface
    pub fn tile_loaded(&mut self) {
        self.tiles.on_load();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MapConfig, TileSource};
    use crate::models::{Category, DEFAULT_MATERIALS};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Log {
        views: Vec<(f64, f64, u8)>,
        tiles: Vec<String>,
        live: Vec<(MarkerId, Marker)>,
        errors: Vec<String>,
        next_id: MarkerId,
    }

    /// Records calls; markers whose popup mentions "explode" fail to render
    #[derive(Clone, Default)]
    struct FakeSurface(Rc<RefCell<Log>>);

    impl MapSurface for FakeSurface {
        fn set_view(&mut self, center: Coordinate, zoom: u8) -> Result<(), RenderError> {
            self.0.borrow_mut().views.push((center.lat(), center.lng(), zoom));
            Ok(())
        }

        fn set_tile_source(&mut self, source: &TileSource) -> Result<(), RenderError> {
            self.0.borrow_mut().tiles.push(source.name.clone());
            Ok(())
        }

        fn add_marker(&mut self, marker: &Marker) -> Result<MarkerId, RenderError> {
            if marker.popup.contains("explode") {
                return Err(RenderError::Marker("boom".to_string()));
            }
            let mut log = self.0.borrow_mut();
            log.next_id += 1;
            let id = log.next_id;
            log.live.push((id, marker.clone()));
            Ok(id)
        }

        fn remove_marker(&mut self, id: MarkerId) {
            self.0.borrow_mut().live.retain(|(m, _)| *m != id);
        }

        fn show_error(&mut self, message: &str) {
            self.0.borrow_mut().errors.push(message.to_string());
        }
    }

    fn place(name: &str, lat: f64, lng: f64) -> Place {
        Place {
            source_id: format!("node/{}", name),
            name: name.to_string(),
            coordinate: Coordinate::new(lat, lng).unwrap(),
            address: None,
            needs_address_lookup: true,
            category: Category::JunkShop,
            materials: vec![DEFAULT_MATERIALS.to_string()],
        }
    }

    fn query() -> Coordinate {
        Coordinate::new(10.0, 10.0).unwrap()
    }

    #[tokio::test]
    async fn test_markers_replaced_between_queries() {
        let fake = FakeSurface::default();
        let log = fake.0.clone();
        let mut map = MapController::with_surface(fake, &MapConfig::default());

        let first = vec![place("a", 10.01, 10.0), place("b", 10.02, 10.0)];
        let summary = map.show_results(query(), DEVICE_LOCATION_LABEL, &first).await.unwrap();
        assert_eq!(summary.placed, 3);
        assert_eq!(log.borrow().live.len(), 3);

        let second = vec![place("c", 20.0, 20.0)];
        let other = Coordinate::new(20.0, 20.0).unwrap();
        map.show_results(other, "Elsewhere", &second).await.unwrap();

        let log = log.borrow();
        assert_eq!(log.live.len(), 2);
        assert_eq!(log.views, vec![(10.0, 10.0, 12), (20.0, 20.0, 12)]);
        assert_eq!(log.tiles, vec!["OpenStreetMap".to_string()]);
        assert_eq!(log.live[0].1.kind, MarkerKind::QueryLocation);
        assert!(log.live[0].1.popup.contains("Elsewhere"));
        assert_eq!(map.marker_count(), 2);
    }

    #[tokio::test]
    async fn test_bad_marker_does_not_abort_render() {
        let fake = FakeSurface::default();
        let log = fake.0.clone();
        let mut map = MapController::with_surface(fake, &MapConfig::default());

        let places = vec![place("ok", 10.01, 10.0), place("explode", 10.02, 10.0), place("fine", 10.03, 10.0)];
        let summary = map.show_results(query(), DEVICE_LOCATION_LABEL, &places).await.unwrap();
        assert_eq!(summary.placed, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(log.borrow().live.len(), 3);

        let extent = summary.extent.unwrap();
        assert_eq!(extent.min().y, 10.0);
        assert_eq!(extent.max().y, 10.03);
    }

    #[tokio::test]
    async fn test_loader_awaited_once() {
        let fake = FakeSurface::default();
        let log = fake.0.clone();
        let loads = Rc::new(RefCell::new(0));
        let counter = loads.clone();
        let mut map = MapController::new(
            async move {
                *counter.borrow_mut() += 1;
                Ok(fake)
            },
            &MapConfig::default(),
        );
        assert!(map.surface().is_none());

        map.show_results(query(), DEVICE_LOCATION_LABEL, &[]).await.unwrap();
        map.show_results(query(), DEVICE_LOCATION_LABEL, &[]).await.unwrap();

        assert_eq!(*loads.borrow(), 1);
        assert!(map.surface().is_some());
        assert_eq!(log.borrow().tiles.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_loader_reports_render_error() {
        let mut map: MapController<FakeSurface> = MapController::new(
            async { Err(RenderError::NotReady("script blocked".to_string())) },
            &MapConfig::default(),
        );
        let result = map.show_results(query(), DEVICE_LOCATION_LABEL, &[]).await;
        assert!(matches!(result, Err(RenderError::NotReady(_))));
    }

    #[tokio::test]
    async fn test_tile_errors_switch_and_exhaust() {
        let fake = FakeSurface::default();
        let log = fake.0.clone();
        let mut map = MapController::with_surface(fake, &MapConfig::default());
        map.show_results(query(), DEVICE_LOCATION_LABEL, &[]).await.unwrap();

        for _ in 0..5 {
            map.tile_error();
        }
        assert_eq!(log.borrow().tiles, vec!["OpenStreetMap", "HOT"]);

        for _ in 0..10 {
            map.tile_error();
        }
        let log = log.borrow();
        assert_eq!(log.tiles, vec!["OpenStreetMap", "HOT", "OSM Direct"]);
        assert_eq!(log.errors, vec![TILES_FAILED.to_string()]);
    }

    #[test]
    fn test_popup_payload() {
        let mut p = place("Acme & Sons", 10.0, 10.0);
        p.set_address("1 Main St".to_string());
        let popup = Popup::for_place(query(), &p);
        assert_eq!(popup.distance, "0.00 km");
        assert_eq!(popup.address_label, "Address");
        let html = popup.to_html().unwrap();
        assert!(html.contains("Acme &amp; Sons"));
        assert!(html.contains("Junk Shop"));
    }

    #[test]
    fn test_unresolved_popup_is_labelled_approximate() {
        let p = place("Acme", 10.5, 10.0);
        let popup = Popup::for_place(query(), &p);
        assert_eq!(popup.address_label, "Approximate location");
        assert_eq!(popup.address, "10.5000, 10.0000");
        assert!(popup.to_html().unwrap().contains("Approximate location:"));
    }
}
