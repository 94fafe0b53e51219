//! Bounded retry with escalating delay around a single batch resolution

use crate::model::{Batch, BatchOutcomes, Outcome};
use crate::resolve::BatchResolver;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Delay between a failed attempt and the next one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// Same pause after every failed attempt
    Fixed { delay_ms: u64 },
    /// Failed attempt `n` (1-based) waits `n * base`
    Linear { base_ms: u64 },
}

impl Backoff {
    /// Pause after the `attempt`-th failure (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            Backoff::Linear { base_ms } => {
                Duration::from_millis(base_ms.saturating_mul(u64::from(attempt)))
            }
        }
    }
}

/// How many times to attempt a batch and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

/// What a retry-wrapped resolution produced.
#[derive(Debug, Clone)]
pub struct Attempted {
    pub outcomes: BatchOutcomes,
    /// Attempts actually made, including the successful one
    pub attempts: u32,
    /// True when every attempt failed and `outcomes` is the synthetic
    /// all-`ERROR` mapping
    pub exhausted: bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Existence-check source: two attempts, fixed 2s pause.
    pub fn existence_check() -> Self {
        Self::new(2, Backoff::Fixed { delay_ms: 2_000 })
    }

    /// Linked-id source: three attempts, 5s/10s pauses.
    pub fn linked_id() -> Self {
        Self::new(3, Backoff::Linear { base_ms: 5_000 })
    }

    /// Attempt `batch` until it succeeds or the ceiling is reached.
    ///
    /// Never fails: on exhaustion every key of the batch is assigned
    /// [`Outcome::Error`], so one unreachable batch cannot stall a run.
    pub async fn resolve_with_retry(
        &self,
        resolver: &dyn BatchResolver,
        batch: &Batch,
    ) -> Attempted {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match resolver.resolve(batch).await {
                Ok(outcomes) => {
                    return Attempted {
                        outcomes,
                        attempts: attempt,
                        exhausted: false,
                    }
                }
                Err(err) if attempt < max_attempts => {
                    let delay = self.backoff.delay_after(attempt);
                    warn!(
                        resolver = resolver.id(),
                        batch = batch.seq(),
                        attempt,
                        error = %err,
                        "batch lookup failed; retrying after {:?}",
                        delay
                    );
                    sleep(delay).await;
                }
                Err(err) => {
                    warn!(
                        resolver = resolver.id(),
                        batch = batch.seq(),
                        attempts = attempt,
                        keys = batch.len(),
                        error = %err,
                        "batch lookup exhausted retries; marking keys ERROR"
                    );
                    return Attempted {
                        outcomes: BatchOutcomes::uniform(batch, Outcome::Error),
                        attempts: attempt,
                        exhausted: true,
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LookupKey;
    use crate::resolve::MockResolver;
    use tokio::time::Instant;

    fn batch(keys: &[&str]) -> Batch {
        Batch::new(1, keys.iter().map(|k| LookupKey::from(*k)).collect())
    }

    /// Paused-clock sleeps land on millisecond ticks.
    fn assert_waited(start: Instant, expected: Duration) {
        let elapsed = start.elapsed();
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(5),
            "expected ~{:?}, waited {:?}",
            expected,
            elapsed
        );
    }

    #[test]
    fn fixed_backoff_is_constant() {
        let backoff = Backoff::Fixed { delay_ms: 2_000 };
        assert_eq!(backoff.delay_after(1), Duration::from_secs(2));
        assert_eq!(backoff.delay_after(5), Duration::from_secs(2));
    }

    #[test]
    fn linear_backoff_scales_with_attempt() {
        let backoff = Backoff::Linear { base_ms: 5_000 };
        assert_eq!(backoff.delay_after(1), Duration::from_secs(5));
        assert_eq!(backoff.delay_after(2), Duration::from_secs(10));
        assert_eq!(backoff.delay_after(3), Duration::from_secs(15));
    }

    #[test]
    fn linear_backoff_saturates_instead_of_overflowing() {
        let backoff = Backoff::Linear {
            base_ms: u64::MAX / 2 + 1,
        };
        assert_eq!(backoff.delay_after(2), Duration::from_millis(u64::MAX));
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_first_attempt_does_not_sleep() {
        let resolver = MockResolver::existence(["Aspirin"]);
        let start = Instant::now();

        let attempted = RetryPolicy::existence_check()
            .resolve_with_retry(&resolver, &batch(&["Aspirin", "Nope"]))
            .await;

        assert!(!attempted.exhausted);
        assert_eq!(attempted.attempts, 1);
        assert_eq!(attempted.outcomes.get("Aspirin"), Some(&Outcome::Exists));
        assert_eq!(attempted.outcomes.get("Nope"), Some(&Outcome::Missing));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failure() {
        let resolver = MockResolver::existence(["Aspirin"]).failing_first(1);
        let start = Instant::now();

        let attempted = RetryPolicy::existence_check()
            .resolve_with_retry(&resolver, &batch(&["Aspirin"]))
            .await;

        assert!(!attempted.exhausted);
        assert_eq!(attempted.attempts, 2);
        assert_eq!(attempted.outcomes.get("Aspirin"), Some(&Outcome::Exists));
        assert_waited(start, Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_marks_every_key_error() {
        let resolver = MockResolver::existence(["Aspirin"]).always_failing();
        let start = Instant::now();

        let attempted = RetryPolicy::existence_check()
            .resolve_with_retry(&resolver, &batch(&["Aspirin", "Nope", "Foo"]))
            .await;

        assert!(attempted.exhausted);
        assert_eq!(attempted.attempts, 2);
        assert_eq!(attempted.outcomes.len(), 3);
        assert!(attempted.outcomes.iter().all(|(_, o)| *o == Outcome::Error));
        // One pause between the two attempts, none after the last.
        assert_waited(start, Duration::from_secs(2));
        assert_eq!(resolver.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn linked_id_policy_waits_linearly() {
        let resolver = MockResolver::linked([("D000001", "Q1")]).always_failing();
        let start = Instant::now();

        let attempted = RetryPolicy::linked_id()
            .resolve_with_retry(&resolver, &batch(&["D000001"]))
            .await;

        assert!(attempted.exhausted);
        assert_eq!(attempted.attempts, 3);
        assert_waited(start, Duration::from_secs(5 + 10));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempt_ceiling_still_tries_once() {
        let resolver = MockResolver::existence(["Aspirin"]);

        let attempted = RetryPolicy::new(0, Backoff::Fixed { delay_ms: 0 })
            .resolve_with_retry(&resolver, &batch(&["Aspirin"]))
            .await;

        assert_eq!(attempted.attempts, 1);
        assert!(!attempted.exhausted);
    }
}
