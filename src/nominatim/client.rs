//! Nominatim forward and reverse geocoding client.

use reqwest::{header, Client};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::address::{format_reverse_address, ReverseResponse};
use super::pacer::Pacer;
use crate::config::{SearchConfig, ServicesConfig};
use crate::error::{FinderError, Result};
use crate::models::Coordinate;

/// Result of a forward geocode
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeHit {
    pub coordinate: Coordinate,
    pub display_name: String,
}

/// Resolves free text to a coordinate. `None` on no match or transport failure.
#[allow(async_fn_in_trait)]
pub trait ForwardGeocoder {
    async fn geocode(&self, query: &str) -> Option<GeocodeHit>;
}

/// Resolves a coordinate to an address. `None` on failure.
///
/// Implementations talking to a rate-limited service pace their own calls.
#[allow(async_fn_in_trait)]
pub trait ReverseGeocoder {
    async fn reverse(&self, coordinate: Coordinate) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    display_name: String,
}

pub struct NominatimClient {
    client: Client,
    base_url: Url,
    pacer: Pacer,
}

impl NominatimClient {
    pub fn new(services: &ServicesConfig, search: &SearchConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(lang) = &search.language {
            let value = header::HeaderValue::from_str(lang)
                .map_err(|e| FinderError::Config(format!("bad language '{}': {}", lang, e)))?;
            headers.insert(header::ACCEPT_LANGUAGE, value);
        }

        let client = Client::builder()
            .user_agent(&services.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(services.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(&services.nominatim_url)?,
            pacer: Pacer::new(Duration::from_millis(search.reverse_delay_ms)),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        Ok(base.join(path)?)
    }

    /// Forward search, propagating errors
    pub async fn search(&self, query: &str) -> Result<Option<GeocodeHit>> {
        let mut url = self.endpoint("search")?;
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("q", query)
            .append_pair("limit", "1");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FinderError::Transport(format!(
                "Nominatim search returned status {}",
                response.status()
            )));
        }

        let hits: Vec<SearchHit> = response.json().await?;
        Ok(hits.into_iter().next().and_then(parse_hit))
    }

    /// Reverse lookup, propagating errors. Not paced.
    pub async fn reverse_lookup(&self, coordinate: Coordinate) -> Result<Option<String>> {
        let mut url = self.endpoint("reverse")?;
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("lat", &coordinate.lat().to_string())
            .append_pair("lon", &coordinate.lng().to_string())
            .append_pair("addressdetails", "1");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FinderError::Transport(format!(
                "Nominatim reverse returned status {}",
                response.status()
            )));
        }

        let body: ReverseResponse = response.json().await?;
        Ok(format_reverse_address(&body))
    }
}

fn parse_hit(hit: SearchHit) -> Option<GeocodeHit> {
    let lat = hit.lat.trim().parse::<f64>().ok()?;
    let lng = hit.lon.trim().parse::<f64>().ok()?;
    let coordinate = Coordinate::new(lat, lng).ok()?;
    Some(GeocodeHit {
        coordinate,
        display_name: hit.display_name,
    })
}

impl ForwardGeocoder for NominatimClient {
    async fn geocode(&self, query: &str) -> Option<GeocodeHit> {
        match self.search(query).await {
            Ok(hit) => {
                debug!("Geocoded '{}' -> {:?}", query, hit);
                hit
            }
            Err(e) => {
                warn!("Geocoding error for '{}': {}", query, e);
                None
            }
        }
    }
}

impl ReverseGeocoder for NominatimClient {
    async fn reverse(&self, coordinate: Coordinate) -> Option<String> {
        self.pacer.wait().await;
        match self.reverse_lookup(coordinate).await {
            Ok(address) => address,
            Err(e) => {
                warn!("Reverse geocoding failed for ({}): {}", coordinate, e);
                None
            }
        }
    }
}
