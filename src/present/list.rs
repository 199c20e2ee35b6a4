//! Sorted result list with in-place address patching.

use minijinja::context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::distance::{format_km, haversine_km};
use crate::error::RenderError;
use crate::models::{Coordinate, Place};
use crate::templates;

/// Whether the displayed address is an address or a coordinate placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    Confirmed,
    Provisional,
}

impl AddressKind {
    pub fn label(&self) -> &'static str {
        match self {
            AddressKind::Confirmed => "Address",
            AddressKind::Provisional => "Approximate location",
        }
    }
}

/// One rendered row of the result list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEntry {
    /// Index of the place in the result set it was rendered from
    pub place_index: usize,
    pub source_id: String,
    pub name: String,
    pub category: String,
    pub address: String,
    pub address_kind: AddressKind,
    pub materials: Vec<String>,
    pub distance_km: f64,
}

impl ListEntry {
    fn from_place(place_index: usize, place: &Place, distance_km: f64) -> Self {
        let (address, address_kind) = address_text(place);
        Self {
            place_index,
            source_id: place.source_id.clone(),
            name: place.name.clone(),
            category: place.category.label().to_string(),
            address,
            address_kind,
            materials: place.materials.clone(),
            distance_km,
        }
    }

    pub fn to_html(&self) -> Result<String, RenderError> {
        templates::render(
            templates::ENTRY,
            context! {
                entry => self,
                label => self.address_kind.label(),
                distance => format_km(self.distance_km),
            },
        )
    }
}

impl std::fmt::Display for ListEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} [{}]", self.name, self.category)?;
        writeln!(f, "  {}: {}", self.address_kind.label(), self.address)?;
        writeln!(f, "  Materials: {}", self.materials.join(", "))?;
        write!(f, "  Distance: {}", format_km(self.distance_km))
    }
}

/// Current address, or the coordinate labelled as provisional
pub(crate) fn address_text(place: &Place) -> (String, AddressKind) {
    match &place.address {
        Some(address) => (address.clone(), AddressKind::Confirmed),
        None => (place.coordinate.format_fixed(), AddressKind::Provisional),
    }
}

/// Places rendered in ascending distance from the query point.
///
/// The order is fixed when the list is built; patches only touch addresses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultList {
    entries: Vec<ListEntry>,
}

impl ResultList {
    /// Stable sort by distance; equal distances keep input order.
    pub fn build(query: Coordinate, places: &[Place]) -> Self {
        let mut entries: Vec<ListEntry> = places
            .iter()
            .enumerate()
            .map(|(i, place)| ListEntry::from_place(i, place, haversine_km(query, place.coordinate)))
            .collect();

        entries.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

        Self { entries }
    }

    pub fn entries(&self) -> &[ListEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Update the displayed address of the entry rendered from `place_index`.
    ///
    /// No-op when that entry does not belong to `place` (list was replaced).
    pub fn patch(&mut self, place_index: usize, place: &Place) -> Option<&ListEntry> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.place_index == place_index && e.source_id == place.source_id)?;

        let (address, kind) = address_text(place);
        debug!("Patching '{}' address -> {}", entry.name, address);
        entry.address = address;
        entry.address_kind = kind;
        Some(entry)
    }

    pub fn to_html(&self) -> Result<String, RenderError> {
        let items = self
            .entries
            .iter()
            .map(ListEntry::to_html)
            .collect::<Result<Vec<_>, _>>()?;
        templates::render(templates::LIST, context! { entries => items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, DEFAULT_MATERIALS};

    fn place(id: &str, lat: f64, lng: f64, address: Option<&str>) -> Place {
        Place {
            source_id: id.to_string(),
            name: format!("Place {}", id),
            coordinate: Coordinate::new(lat, lng).unwrap(),
            address: address.map(str::to_string),
            needs_address_lookup: address.is_none(),
            category: Category::RecyclingCenter,
            materials: vec![DEFAULT_MATERIALS.to_string()],
        }
    }

    fn origin() -> Coordinate {
        Coordinate::new(0.0, 0.0).unwrap()
    }

    // One degree of latitude is ~111 km, so scale km to degrees
    fn at_km(id: &str, km: f64) -> Place {
        place(id, km / 111.19, 0.0, None)
    }

    #[test]
    fn test_sorted_by_distance() {
        let places = vec![at_km("a", 5.0), at_km("b", 1.0), at_km("c", 3.0)];
        let list = ResultList::build(origin(), &places);
        let ids: Vec<&str> = list.entries().iter().map(|e| e.source_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let places = vec![
            place("first", 1.0, 0.0, None),
            place("second", 0.0, 1.0, None),
            place("third", -1.0, 0.0, None),
        ];
        let list = ResultList::build(origin(), &places);
        let ids: Vec<&str> = list.entries().iter().map(|e| e.source_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_patch_keeps_order() {
        let mut places = vec![at_km("a", 5.0), at_km("b", 1.0), at_km("c", 3.0)];
        let mut list = ResultList::build(origin(), &places);
        assert_eq!(list.entries()[2].address_kind, AddressKind::Provisional);

        places[0].set_address("5 Far Away Rd".to_string());
        let patched = list.patch(0, &places[0]).unwrap();
        assert_eq!(patched.address, "5 Far Away Rd");
        assert_eq!(patched.address_kind, AddressKind::Confirmed);

        let ids: Vec<&str> = list.entries().iter().map(|e| e.source_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert_eq!(list.entries()[0].address_kind, AddressKind::Provisional);
    }

    #[test]
    fn test_patch_ignores_foreign_place() {
        let places = vec![at_km("a", 1.0)];
        let mut list = ResultList::build(origin(), &places);
        let mut other = place("z", 1.0, 1.0, None);
        other.set_address("elsewhere".to_string());
        assert!(list.patch(0, &other).is_none());
        assert_eq!(list.entries()[0].address_kind, AddressKind::Provisional);
    }

    #[test]
    fn test_provisional_address_is_coordinate() {
        let places = vec![place("a", 12.345678, -98.765432, None)];
        let list = ResultList::build(origin(), &places);
        assert_eq!(list.entries()[0].address, "12.3457, -98.7654");
    }

    #[test]
    fn test_html_rendering() {
        let places = vec![place("a", 0.01, 0.0, Some("1 <Main> St"))];
        let html = ResultList::build(origin(), &places).to_html().unwrap();
        assert!(html.contains("Place a"));
        assert!(html.contains("1 &lt;Main&gt; St"));
        assert!(html.contains("Recycling Center"));
        assert!(html.contains("Various materials"));
        assert!(html.contains("1.11 km"));
    }

    #[test]
    fn test_empty_list_placeholder() {
        let html = ResultList::build(origin(), &[]).to_html().unwrap();
        assert!(html.contains(crate::present::NO_RESULTS));
    }
}
