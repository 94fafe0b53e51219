//! The sequential batch loop
//!
//! Load snapshot → batch eligible keys → for each batch: retry-wrapped
//! resolve, merge, periodic flush, progress line, pace → final flush.

use super::batcher::Batcher;
use super::cancel::CancellationToken;
use super::governor::RateGovernor;
use super::retry::{Backoff, RetryPolicy};
use crate::model::{LookupKey, OutcomeCounts};
use crate::resolve::BatchResolver;
use crate::storage::{CheckpointResult, CheckpointStore};
use tracing::{info, warn};

/// Which sweep over the key set this run is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pass {
    /// First pass over fresh keys
    #[default]
    Initial,
    /// Follow-up pass aimed at keys a previous run left as `ERROR`
    Resweep,
}

/// Tunables for one run against one source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    pub batch_size: usize,
    pub retry: RetryPolicy,
    pub governor: RateGovernor,
    /// Flush the checkpoint after every `flush_every` batches
    pub flush_every: usize,
    /// Log a progress line every `progress_every` batches
    pub progress_every: usize,
}

impl RunSettings {
    /// No pacing, no retry delay, flush after every batch. For tests and
    /// offline mocks.
    pub fn immediate(batch_size: usize) -> Self {
        Self {
            batch_size,
            retry: RetryPolicy::new(2, Backoff::Fixed { delay_ms: 0 }),
            governor: RateGovernor::unpaced(),
            flush_every: 1,
            progress_every: 1,
        }
    }

    pub fn with_flush_every(mut self, batches: usize) -> Self {
        self.flush_every = batches;
        self
    }
}

/// What a run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Keys already holding a final outcome when the run started
    pub keys_already_resolved: usize,
    /// Keys the batcher handed out for (re)resolution
    pub keys_eligible: usize,
    pub batches_planned: usize,
    pub batches_processed: usize,
    /// Batches whose every attempt failed
    pub batches_exhausted: usize,
    /// Keys recorded as `ERROR` by exhausted batches
    pub keys_errored: usize,
    pub flushes: usize,
    /// True when a stop was requested before every batch ran
    pub interrupted: bool,
    /// Outcome tallies over the whole snapshot after the final flush
    pub counts: OutcomeCounts,
}

/// Drives one resolver over a key set, persisting progress as it goes.
pub struct Pipeline<'r> {
    resolver: &'r dyn BatchResolver,
    settings: RunSettings,
    cancel: CancellationToken,
}

impl<'r> Pipeline<'r> {
    pub fn new(resolver: &'r dyn BatchResolver, settings: RunSettings) -> Self {
        Self {
            resolver,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop before the next batch once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Resolve every eligible key of `keys`.
    ///
    /// Resolver failures never abort the run; they end up as `ERROR`
    /// outcomes. A checkpoint write failure does abort it, and at most the
    /// batches since the last successful flush are lost.
    pub async fn run(
        &self,
        keys: &[LookupKey],
        store: &mut dyn CheckpointStore,
    ) -> CheckpointResult<RunSummary> {
        let flush_every = self.settings.flush_every.max(1);
        let progress_every = self.settings.progress_every.max(1);

        let snapshot = store.load()?;
        let batcher = Batcher::new(keys, snapshot, self.settings.batch_size);
        let total = batcher.total_batches();
        let mut summary = RunSummary {
            keys_already_resolved: snapshot.len() - snapshot.counts().error,
            keys_eligible: batcher.eligible_count(),
            batches_planned: total,
            ..RunSummary::default()
        };

        info!(
            resolver = self.resolver.id(),
            keys = keys.len(),
            eligible = summary.keys_eligible,
            batches = total,
            "starting run"
        );

        for batch in batcher {
            if self.cancel.is_cancelled() {
                warn!(
                    resolver = self.resolver.id(),
                    done = summary.batches_processed,
                    planned = total,
                    "stop requested; finishing early"
                );
                summary.interrupted = true;
                break;
            }

            let attempted = self
                .settings
                .retry
                .resolve_with_retry(self.resolver, &batch)
                .await;
            if attempted.exhausted {
                summary.batches_exhausted += 1;
                summary.keys_errored += batch.len();
            }
            store.merge(attempted.outcomes);
            summary.batches_processed += 1;

            if batch.seq() % flush_every == 0 {
                store.flush()?;
                summary.flushes += 1;
            }

            if batch.seq() % progress_every == 0 || batch.seq() == total {
                info!(
                    resolver = self.resolver.id(),
                    "batch {}/{} done ({} total checked)",
                    batch.seq(),
                    total,
                    store.snapshot().len()
                );
            }

            self.settings.governor.pace().await;
        }

        store.flush()?;
        summary.flushes += 1;
        summary.counts = store.snapshot().counts();

        info!(
            resolver = self.resolver.id(),
            processed = summary.batches_processed,
            exhausted = summary.batches_exhausted,
            interrupted = summary.interrupted,
            "run finished"
        );
        Ok(summary)
    }
}
