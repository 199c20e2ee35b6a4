//! Error taxonomy shared by the lookup pipeline.

use thiserror::Error;

/// Errors surfaced by the finder pipeline.
///
/// Only `EmptyQuery`, `NotFound` and `PermissionDenied` are meant to reach the
/// user. `Transport` is logged and degraded to "no data" at the collaborator
/// seams, and `Render` is caught per marker or per map.
#[derive(Debug, Error)]
pub enum FinderError {
    #[error("Please enter a location or use your device location.")]
    EmptyQuery,

    #[error("Location not found. Please try a different address or city name.")]
    NotFound,

    #[error("Location access failed. Please allow location access or search by address.")]
    PermissionDenied,

    #[error("invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("query superseded by a newer search")]
    Superseded,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for FinderError {
    fn from(e: reqwest::Error) -> Self {
        FinderError::Transport(e.to_string())
    }
}

impl From<url::ParseError> for FinderError {
    fn from(e: url::ParseError) -> Self {
        FinderError::Config(format!("bad service url: {}", e))
    }
}

/// Failure reported by a map surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("map library failed to load: {0}")]
    NotReady(String),

    #[error("could not place marker: {0}")]
    Marker(String),

    #[error("template error: {0}")]
    Template(String),
}

impl From<minijinja::Error> for RenderError {
    fn from(e: minijinja::Error) -> Self {
        RenderError::Template(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FinderError>;
