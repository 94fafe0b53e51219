//! Fixed-interval pacing between upstream calls

use std::time::Duration;
use tokio::time::sleep;

/// Sleeps a fixed interval once per completed batch.
///
/// Not adaptive and without jitter: the interval is chosen per source to stay
/// under the upstream's abuse thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateGovernor {
    interval: Duration,
}

impl RateGovernor {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// No pacing at all (tests, local mocks)
    pub fn unpaced() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait out the interval after a batch, successful or exhausted.
    pub async fn pace(&self) {
        if !self.interval.is_zero() {
            sleep(self.interval).await;
        }
    }
}
