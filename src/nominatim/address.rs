//! Reverse geocoding response types and address formatting.

use serde::Deserialize;

/// Structured address returned with `addressdetails=1`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressDetails {
    pub house_number: Option<String>,
    pub road: Option<String>,
    pub neighbourhood: Option<String>,
    pub suburb: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub postcode: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

/// `/reverse` response. Failures come back as `{"error": "..."}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReverseResponse {
    pub display_name: Option<String>,
    pub address: Option<AddressDetails>,
    pub error: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl AddressDetails {
    /// Components in display order, skipping the ones Nominatim left out
    pub fn components(&self) -> Vec<&str> {
        [
            present(&self.house_number),
            present(&self.road),
            present(&self.neighbourhood).or_else(|| present(&self.suburb)),
            present(&self.city)
                .or_else(|| present(&self.town))
                .or_else(|| present(&self.village)),
            present(&self.postcode),
            present(&self.state),
            present(&self.country),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Joined structured address, else the free-text display name.
pub fn format_reverse_address(response: &ReverseResponse) -> Option<String> {
    if response.error.is_some() {
        return None;
    }

    if let Some(details) = &response.address {
        let parts = details.components();
        if !parts.is_empty() {
            return Some(parts.join(", "));
        }
    }

    present(&response.display_name).map(str::to_string)
}
