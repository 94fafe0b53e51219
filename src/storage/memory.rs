//! In-memory checkpoint backend

use super::traits::{CheckpointResult, CheckpointStore};
use crate::model::{BatchOutcomes, Snapshot};

/// Checkpoint store that keeps its "durable" copy in memory.
///
/// The durable copy only changes on `flush`, so a test can observe exactly
/// what a killed process would have left behind.
#[derive(Debug, Default)]
pub struct MemoryStore {
    live: Snapshot,
    durable: Option<Snapshot>,
    flushes: usize,
}

impl MemoryStore {
    /// A store with nothing persisted yet
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose durable copy is `snapshot`, as if left by a prior run
    pub fn with_durable(snapshot: Snapshot) -> Self {
        Self {
            live: Snapshot::new(),
            durable: Some(snapshot),
            flushes: 0,
        }
    }

    /// The last flushed snapshot, if any flush ever happened
    pub fn durable(&self) -> Option<&Snapshot> {
        self.durable.as_ref()
    }

    /// Number of successful flushes
    pub fn flush_count(&self) -> usize {
        self.flushes
    }
}

impl CheckpointStore for MemoryStore {
    fn load(&mut self) -> CheckpointResult<&Snapshot> {
        self.live = self.durable.clone().unwrap_or_default();
        Ok(&self.live)
    }

    fn snapshot(&self) -> &Snapshot {
        &self.live
    }

    fn merge(&mut self, outcomes: BatchOutcomes) {
        self.live.merge(outcomes);
    }

    fn flush(&mut self) -> CheckpointResult<()> {
        self.durable = Some(self.live.clone());
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Batch, LookupKey, Outcome};

    fn batch(keys: &[&str]) -> Batch {
        Batch::new(1, keys.iter().map(|k| LookupKey::from(*k)).collect())
    }

    #[test]
    fn fresh_store_loads_empty() {
        let mut store = MemoryStore::new();
        assert!(store.load().unwrap().is_empty());
        assert!(store.durable().is_none());
    }

    #[test]
    fn merge_is_invisible_to_durable_until_flush() {
        let mut store = MemoryStore::new();
        store.load().unwrap();
        store.merge(BatchOutcomes::uniform(&batch(&["a", "b"]), Outcome::Exists));

        assert_eq!(store.snapshot().len(), 2);
        assert!(store.durable().is_none());

        store.flush().unwrap();
        assert_eq!(store.durable().map(Snapshot::len), Some(2));
        assert_eq!(store.flush_count(), 1);
    }

    #[test]
    fn reload_discards_unflushed_state() {
        let mut store = MemoryStore::new();
        store.merge(BatchOutcomes::uniform(&batch(&["a"]), Outcome::Exists));
        store.flush().unwrap();
        store.merge(BatchOutcomes::uniform(&batch(&["b"]), Outcome::Missing));

        let reloaded = store.load().unwrap();
        assert!(reloaded.contains("a"));
        assert!(!reloaded.contains("b"));
    }

    #[test]
    fn with_durable_seeds_prior_run() {
        let prior: Snapshot = [(LookupKey::from("x"), Outcome::Error)].into_iter().collect();
        let mut store = MemoryStore::with_durable(prior);

        assert_eq!(store.load().unwrap().get("x"), Some(&Outcome::Error));
    }
}
