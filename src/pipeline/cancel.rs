//! Cooperative stop signal for a running pipeline
//!
//! The run loop checks the token before starting each batch. Batches already
//! merged stay merged, and the final checkpoint flush still happens, so a
//! stop requested from outside (Ctrl-C) never loses completed work.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Shared stop flag; clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Ask the run to stop before its next batch.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Cancel on the first signal from `next_signal`, then wait for another.
    ///
    /// Returns `true` when a second signal arrives, meaning the caller should
    /// stop waiting for the run and exit now. Returns `false` if listening for
    /// signals fails.
    pub async fn cancel_on_signal<F, Fut>(&self, mut next_signal: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::io::Result<()>>,
    {
        if next_signal().await.is_err() {
            return false;
        }
        warn!("interrupt received; stopping after the current batch (interrupt again to exit now)");
        self.cancel();

        next_signal().await.is_ok()
    }
}
