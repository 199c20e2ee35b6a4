//! Overpass API client for nearby feature lookups.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::query::build_around_query;
use crate::config::{SearchConfig, ServicesConfig};
use crate::error::{FinderError, Result};
use crate::models::{Coordinate, RawFeature};
use crate::normalize::CategoryRule;

/// Source of raw geographic features around a point.
///
/// Never fails: transport problems come back as an empty list.
#[allow(async_fn_in_trait)]
pub trait FeatureSource {
    async fn fetch_nearby(&self, center: Coordinate, radius_m: u32) -> Vec<RawFeature>;
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<RawFeature>,
}

/// Queries the Overpass interpreter for features matching the category rules
pub struct OverpassClient {
    client: Client,
    endpoint: String,
    rules: Vec<CategoryRule>,
    timeout_secs: u32,
}

impl OverpassClient {
    pub fn new(
        services: &ServicesConfig,
        search: &SearchConfig,
        rules: Vec<CategoryRule>,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&services.user_agent)
            .timeout(Duration::from_secs(services.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: services.overpass_url.clone(),
            rules,
            timeout_secs: search.overpass_timeout_secs,
        })
    }

    /// Run the query, propagating transport and decode errors
    pub async fn query(&self, center: Coordinate, radius_m: u32) -> Result<Vec<RawFeature>> {
        let query = build_around_query(center, radius_m, &self.rules, self.timeout_secs);
        debug!("Overpass query:\n{}", query);

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("data", query.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FinderError::Transport(format!(
                "Overpass returned status {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        parse_response(&body)
    }
}

impl FeatureSource for OverpassClient {
    async fn fetch_nearby(&self, center: Coordinate, radius_m: u32) -> Vec<RawFeature> {
        match self.query(center, radius_m).await {
            Ok(features) => {
                info!(
                    "Overpass returned {} features within {} m of {}",
                    features.len(),
                    radius_m,
                    center
                );
                features
            }
            Err(e) => {
                warn!("Feature query failed: {}", e);
                Vec::new()
            }
        }
    }
}

pub fn parse_response(body: &str) -> Result<Vec<RawFeature>> {
    let data: OverpassResponse = serde_json::from_str(body)
        .map_err(|e| FinderError::Transport(format!("bad Overpass response: {}", e)))?;
    Ok(data.elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ElementKind;

    #[test]
    fn test_parse_mixed_elements() {
        let body = r#"{
            "version": 0.6,
            "generator": "Overpass API",
            "elements": [
                {"type": "node", "id": 1, "lat": 39.78, "lon": -89.64,
                 "tags": {"amenity": "recycling", "name": "Acme"}},
                {"type": "way", "id": 2, "center": {"lat": 39.79, "lon": -89.61},
                 "nodes": [10, 11, 12],
                 "tags": {"shop": "scrap_yard"}},
                {"type": "relation", "id": 3, "tags": {"amenity": "recycling"}}
            ]
        }"#;

        let features = parse_response(body).unwrap();
        assert_eq!(features.len(), 3);
        assert_eq!(features[1].kind, ElementKind::Way);
        assert!(features[1].coordinate().is_some());
        assert!(features[2].coordinate().is_none());
    }

    #[test]
    fn test_parse_without_elements() {
        assert!(parse_response(r#"{"remark": "runtime error"}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_parse_garbage_is_transport_error() {
        assert!(matches!(
            parse_response("<html>busy</html>"),
            Err(FinderError::Transport(_))
        ));
    }
}
