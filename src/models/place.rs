//! Normalized place entity.

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Materials entry used when the source lists none
pub const DEFAULT_MATERIALS: &str = "Various materials";

/// Kind of facility, resolved from the category tag rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// `amenity=recycling`
    RecyclingCenter,
    /// `shop=scrap_yard`
    JunkShop,
    /// Anything else a broader query lets through
    RecyclingFacility,
}

impl Category {
    /// Human-readable label, also the prefix of synthesized names
    pub fn label(&self) -> &'static str {
        match self {
            Category::RecyclingCenter => "Recycling Center",
            Category::JunkShop => "Junk Shop",
            Category::RecyclingFacility => "Recycling Facility",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A recycling center or scrap yard in the active result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// "{kind}/{id}" of the feature this place came from
    pub source_id: String,

    /// Never empty after normalization
    pub name: String,

    pub coordinate: Coordinate,

    /// Structured address, absent until enrichment when the tags had none
    pub address: Option<String>,

    /// Set iff `address` was absent after normalization; cleared by enrichment
    pub needs_address_lookup: bool,

    pub category: Category,

    /// Never empty
    pub materials: Vec<String>,
}

impl Place {
    /// Fill in the address and clear the lookup flag.
    pub fn set_address(&mut self, address: String) {
        self.address = Some(address);
        self.needs_address_lookup = false;
    }
}
