//! Request pacing for rate-limited upstream services.

use std::time::Duration;
use tracing::debug;

/// Waits a fixed delay ahead of every request.
///
/// Callers await requests one at a time, so a delay before each request keeps
/// the rate at or below one request per `delay`.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    delay: Duration,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub async fn wait(&self) {
        if self.delay.is_zero() {
            return;
        }
        debug!("Pacing upstream request by {:?}", self.delay);
        tokio::time::sleep(self.delay).await;
    }
}
