//! Fixed-interval request gate.
//!
//! Upstream rate limits are respected by spacing requests, not by
//! reacting to 429s alone. The gate is deliberately separate from the
//! retry/backoff logic in the parent module so the two can be tuned
//! and tested independently: backoff handles failure, the gate handles
//! politeness.

use std::time::Duration;

use tokio::time::Instant;

/// Enforces a minimum interval between consecutive requests.
///
/// The first call passes immediately; each subsequent call sleeps
/// until `interval` has elapsed since the previous one.
#[derive(Debug)]
pub struct RequestGate {
    interval: Duration,
    last: Option<Instant>,
}

impl RequestGate {
    /// Create a gate with the given minimum spacing.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Wait until the next request is allowed, then mark it as issued.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
