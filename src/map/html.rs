//! Map surface that renders a standalone Leaflet page.

use chrono::{DateTime, Utc};
use minijinja::context;
use serde::Serialize;
use std::collections::BTreeMap;

use super::surface::{MapSurface, Marker, MarkerId};
use crate::config::TileSource;
use crate::error::RenderError;
use crate::models::Coordinate;
use crate::templates;

#[derive(Debug, Clone, Copy, Serialize)]
struct View {
    lat: f64,
    lng: f64,
    zoom: u8,
}

/// Records the map state and writes it out as HTML + Leaflet.
///
/// Tile sources from the first installed onwards are emitted so the page
/// repeats the fallback chain in the browser.
#[derive(Debug, Default)]
pub struct HtmlMap {
    view: Option<View>,
    tiles: Vec<TileSource>,
    markers: BTreeMap<MarkerId, Marker>,
    next_id: MarkerId,
    error: Option<String>,
    max_tile_errors: u32,
}

impl HtmlMap {
    pub fn new(all_sources: &[TileSource], max_tile_errors: u32) -> Self {
        Self {
            tiles: all_sources.to_vec(),
            max_tile_errors,
            ..Default::default()
        }
    }

    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.values()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Full page with the list HTML next to the map
    pub fn render_page(
        &self,
        title: &str,
        query: Coordinate,
        list_html: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<String, RenderError> {
        let error = match (&self.error, self.view) {
            (Some(message), _) => Some(message.clone()),
            (None, None) => Some(super::MAP_LOAD_FAILED.to_string()),
            (None, Some(_)) => None,
        };
        let markers: Vec<&Marker> = self.markers.values().collect();

        templates::render(
            templates::PAGE,
            context! {
                title => title,
                query => query.format_fixed(),
                generated_at => generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
                list => list_html,
                error => error,
                view => self.view,
                tiles => &self.tiles,
                markers => markers,
                max_tile_errors => self.max_tile_errors,
                tiles_failed => super::TILES_FAILED,
            },
        )
    }
}

impl MapSurface for HtmlMap {
    fn set_view(&mut self, center: Coordinate, zoom: u8) -> Result<(), RenderError> {
        self.view = Some(View {
            lat: center.lat(),
            lng: center.lng(),
            zoom,
        });
        self.error = None;
        Ok(())
    }

    fn set_tile_source(&mut self, source: &TileSource) -> Result<(), RenderError> {
        // Drop everything ahead of the active source
        match self.tiles.iter().position(|t| t == source) {
            Some(pos) => {
                self.tiles.drain(..pos);
            }
            None => self.tiles.insert(0, source.clone()),
        }
        Ok(())
    }

    fn add_marker(&mut self, marker: &Marker) -> Result<MarkerId, RenderError> {
        self.next_id += 1;
        self.markers.insert(self.next_id, marker.clone());
        Ok(self.next_id)
    }

    fn remove_marker(&mut self, id: MarkerId) {
        self.markers.remove(&id);
    }

    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }
}
