//! TOML configuration for service endpoints, search and map settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub services: ServicesConfig,
    pub search: SearchConfig,
    pub map: MapConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServicesConfig {
    pub nominatim_url: String,
    pub overpass_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// Feature query radius in meters
    pub radius_m: u32,
    /// Server-side timeout passed inside the Overpass query
    pub overpass_timeout_secs: u32,
    /// Minimum delay ahead of each reverse geocoding call
    pub reverse_delay_ms: u64,
    /// Optional Accept-Language for geocoding results
    pub language: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub zoom: u8,
    /// Tile errors tolerated before switching to the next source
    pub max_tile_errors: u32,
    /// Ordered tile sources, first is primary
    pub tile_sources: Vec<TileSource>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TileSource {
    pub name: String,
    pub url: String,
    pub attribution: String,
}

impl TileSource {
    fn new(name: &str, url: &str, attribution: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            attribution: attribution.to_string(),
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            overpass_url: "https://overpass-api.de/api/interpreter".to_string(),
            user_agent: format!("reclaim/{} (recycling finder)", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            radius_m: 10_000,
            overpass_timeout_secs: 25,
            reverse_delay_ms: 1_000,
            language: None,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            zoom: 12,
            max_tile_errors: 5,
            tile_sources: default_tile_sources(),
        }
    }
}

pub fn default_tile_sources() -> Vec<TileSource> {
    vec![
        TileSource::new(
            "OpenStreetMap",
            "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
            "© OpenStreetMap contributors",
        ),
        TileSource::new(
            "HOT",
            "https://{s}.tile.openstreetmap.fr/hot/{z}/{x}/{y}.png",
            "© OpenStreetMap contributors, Tiles style by HOT",
        ),
        TileSource::new(
            "OSM Direct",
            "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
            "© OpenStreetMap contributors",
        ),
    ]
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.map.tile_sources.is_empty() {
            anyhow::bail!("map.tile_sources must list at least one source");
        }
        if self.map.max_tile_errors == 0 {
            anyhow::bail!("map.max_tile_errors must be at least 1");
        }
        if self.search.radius_m == 0 {
            anyhow::bail!("search.radius_m must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.search.radius_m, 10_000);
        assert_eq!(config.search.reverse_delay_ms, 1_000);
        assert_eq!(config.map.max_tile_errors, 5);
        assert_eq!(config.map.zoom, 12);
        assert_eq!(config.map.tile_sources.len(), 3);
        assert_eq!(config.map.tile_sources[1].name, "HOT");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[search]
radius_m = 2500
language = "de"

[services]
user_agent = "test-agent"
"#
        )
        .unwrap();

        let config = Config::load_from_file(file.path()).unwrap();
        assert_eq!(config.search.radius_m, 2500);
        assert_eq!(config.search.language.as_deref(), Some("de"));
        assert_eq!(config.search.overpass_timeout_secs, 25);
        assert_eq!(config.services.user_agent, "test-agent");
        assert_eq!(
            config.services.nominatim_url,
            "https://nominatim.openstreetmap.org"
        );
        assert_eq!(config.map.tile_sources.len(), 3);
    }

    #[test]
    fn test_rejects_empty_tile_sources() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[map]\ntile_sources = []").unwrap();
        assert!(Config::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(Config::load_from_file("/nonexistent/reclaim.toml").is_err());
    }
}
