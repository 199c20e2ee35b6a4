//! Raw geographic features as returned by the feature database.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Coordinate;

/// Open-ended OSM tag set
pub type Tags = BTreeMap<String, String>;

/// Type of OSM element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementKind::Node => write!(f, "node"),
            ElementKind::Way => write!(f, "way"),
            ElementKind::Relation => write!(f, "relation"),
        }
    }
}

/// Representative point of a way or relation (`out center`)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Center {
    pub lat: f64,
    pub lon: f64,
}

/// One element of an Overpass `out center` response.
///
/// Nodes carry `lat`/`lon` directly; ways and relations only carry `center`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFeature {
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<Center>,
    #[serde(default)]
    pub tags: Tags,
}

impl RawFeature {
    /// Unique source identifier: "{kind}/{id}"
    pub fn source_id(&self) -> String {
        format!("{}/{}", self.kind, self.id)
    }

    /// Resolve the feature's position: direct coordinate first, then centroid.
    pub fn coordinate(&self) -> Option<Coordinate> {
        let direct = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Coordinate::new(lat, lon).ok(),
            _ => None,
        };
        direct.or_else(|| {
            self.center
                .and_then(|c| Coordinate::new(c.lat, c.lon).ok())
        })
    }

    /// Non-blank tag value
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}
