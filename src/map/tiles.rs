//! Tile-source fallback policy.

use tracing::{error, info, warn};

use crate::config::TileSource;

/// What the map should do after a tile event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileEvent {
    /// Keep the current source
    Unchanged,
    /// Replace the tile layer with this source
    Switched(TileSource),
    /// Every source has failed; show an error instead of the map
    Exhausted,
}

/// Tracks tile load errors against an ordered list of sources.
///
/// Each error bumps the counter and each successful load decays it by one.
/// Reaching the threshold moves to the next source with a fresh counter.
#[derive(Debug, Clone)]
pub struct TileFallback {
    sources: Vec<TileSource>,
    index: usize,
    errors: u32,
    threshold: u32,
    exhausted: bool,
}

impl TileFallback {
    pub fn new(sources: Vec<TileSource>, threshold: u32) -> Self {
        Self {
            exhausted: sources.is_empty(),
            sources,
            index: 0,
            errors: 0,
            threshold: threshold.max(1),
        }
    }

    /// Source in use, `None` once exhausted
    pub fn current(&self) -> Option<&TileSource> {
        if self.exhausted {
            None
        } else {
            self.sources.get(self.index)
        }
    }

    pub fn error_count(&self) -> u32 {
        self.errors
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn on_error(&mut self) -> TileEvent {
        if self.exhausted {
            return TileEvent::Unchanged;
        }

        self.errors += 1;
        let name = &self.sources[self.index].name;
        warn!("Tile error {}/{} for {}", self.errors, self.threshold, name);

        if self.errors < self.threshold {
            return TileEvent::Unchanged;
        }

        self.errors = 0;
        if self.index + 1 < self.sources.len() {
            self.index += 1;
            let next = self.sources[self.index].clone();
            info!("Switching to fallback tile server: {}", next.name);
            TileEvent::Switched(next)
        } else {
            error!("All tile servers failed");
            self.exhausted = true;
            TileEvent::Exhausted
        }
    }

    pub fn on_load(&mut self) {
        self.errors = self.errors.saturating_sub(1);
    }
}
