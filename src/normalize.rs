//! Place normalization.
//!
//! Turns raw features with inconsistent tag sets into uniform [`Place`]s,
//! inferring name, category, address and materials from whatever tags are
//! present. Features without a resolvable coordinate are dropped.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Category, Place, RawFeature, DEFAULT_MATERIALS};

/// Tags tried in order for a display name
const NAME_TAGS: &[&str] = &["name", "name:en", "operator", "brand", "operator:name"];

/// Structured address tags, in join order
const ADDRESS_TAGS: &[&str] = &[
    "addr:housenumber",
    "addr:street",
    "addr:city",
    "addr:postcode",
    "addr:state",
];

/// Single-tag address fallbacks when no structured parts are present
const ADDRESS_FALLBACK_TAGS: &[&str] = &["addr:full", "addr:street", "addr:city"];

/// Tags that stand in for the city in a synthesized name
const CITY_TAGS: &[&str] = &["addr:city", "addr:suburb", "addr:town"];

/// A tag rule that selects features and assigns their category.
///
/// The same rules drive the feature query selectors and category resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub key: String,
    pub value: String,
    pub category: Category,
}

impl CategoryRule {
    pub fn new(key: &str, value: &str, category: Category) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            category,
        }
    }

    pub fn matches(&self, feature: &RawFeature) -> bool {
        feature.tag(&self.key) == Some(self.value.as_str())
    }
}

/// Recycling amenities and scrap yards
pub fn default_rules() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new("amenity", "recycling", Category::RecyclingCenter),
        CategoryRule::new("shop", "scrap_yard", Category::JunkShop),
    ]
}

/// Normalize a batch of features, dropping those without a coordinate.
pub fn normalize(features: &[RawFeature], rules: &[CategoryRule]) -> Vec<Place> {
    let places: Vec<Place> = features
        .iter()
        .filter_map(|f| normalize_feature(f, rules))
        .collect();

    debug!(
        "Normalized {} of {} features into places",
        places.len(),
        features.len()
    );

    places
}

/// Normalize one feature. `None` if it has neither a coordinate nor a centroid.
pub fn normalize_feature(feature: &RawFeature, rules: &[CategoryRule]) -> Option<Place> {
    let coordinate = match feature.coordinate() {
        Some(c) => c,
        None => {
            debug!("Dropping {}: no coordinate", feature.source_id());
            return None;
        }
    };

    // Category feeds the synthesized name, so it goes first
    let category = resolve_category(feature, rules);
    let name = resolve_name(feature, category);
    let address = resolve_address(feature);
    let materials = resolve_materials(feature);

    Some(Place {
        source_id: feature.source_id(),
        name,
        coordinate,
        needs_address_lookup: address.is_none(),
        address,
        category,
        materials,
    })
}

pub fn resolve_category(feature: &RawFeature, rules: &[CategoryRule]) -> Category {
    rules
        .iter()
        .find(|rule| rule.matches(feature))
        .map(|rule| rule.category)
        .unwrap_or(Category::RecyclingFacility)
}

pub fn resolve_name(feature: &RawFeature, category: Category) -> String {
    if let Some(name) = NAME_TAGS.iter().find_map(|key| feature.tag(key)) {
        return name.to_string();
    }

    let label = category.label();
    let street = feature.tag("addr:street");
    let housenumber = feature.tag("addr:housenumber");
    let city = CITY_TAGS.iter().find_map(|key| feature.tag(key));

    match (housenumber, street, city) {
        (Some(number), Some(street), _) => format!("{} - {} {}", label, number, street),
        (None, Some(street), _) => format!("{} - {}", label, street),
        (_, None, Some(city)) => format!("{} - {}", label, city),
        _ => label.to_string(),
    }
}

/// Structured address from tags, or `None` when the place needs a lookup.
pub fn resolve_address(feature: &RawFeature) -> Option<String> {
    let parts: Vec<&str> = ADDRESS_TAGS
        .iter()
        .filter_map(|key| feature.tag(key))
        .collect();

    if !parts.is_empty() {
        return Some(parts.join(", "));
    }

    ADDRESS_FALLBACK_TAGS
        .iter()
        .find_map(|key| feature.tag(key))
        .map(str::to_string)
}

pub fn resolve_materials(feature: &RawFeature) -> Vec<String> {
    if let Some(types) = feature.tag("recycling_type") {
        let materials: Vec<String> = types
            .split(';')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();
        if !materials.is_empty() {
            return materials;
        }
    }

    if let Some(single) = feature.tag("recycling") {
        return vec![single.to_string()];
    }

    vec![DEFAULT_MATERIALS.to_string()]
}
