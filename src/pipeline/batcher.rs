//! Partitioning of unresolved keys into API-sized batches

use crate::model::{Batch, LookupKey, Snapshot};
use std::collections::HashSet;

/// Lazy, single-use sequence of batches over the keys still needing work.
///
/// Eligibility is decided once, against the snapshot given at construction:
/// a key is eligible when it is absent from the snapshot or holds a
/// retryable outcome. Duplicate keys keep their first position. Batches
/// preserve the relative order of eligible keys and hold between 1 and
/// `max_size` keys.
#[derive(Debug)]
pub struct Batcher {
    pending: std::vec::IntoIter<LookupKey>,
    max_size: usize,
    eligible: usize,
    next_seq: usize,
}

impl Batcher {
    /// # Panics
    ///
    /// Panics if `max_size` is zero.
    pub fn new<'a>(
        keys: impl IntoIterator<Item = &'a LookupKey>,
        snapshot: &Snapshot,
        max_size: usize,
    ) -> Self {
        assert!(max_size > 0, "batch size must be positive");

        let mut seen: HashSet<&LookupKey> = HashSet::new();
        let mut eligible = Vec::new();
        for key in keys {
            if snapshot.is_eligible(key.as_str()) && seen.insert(key) {
                eligible.push(key.clone());
            }
        }

        Self {
            eligible: eligible.len(),
            pending: eligible.into_iter(),
            max_size,
            next_seq: 1,
        }
    }

    /// Number of keys that will be handed out across all batches
    pub fn eligible_count(&self) -> usize {
        self.eligible
    }

    /// Number of batches the full sequence yields
    pub fn total_batches(&self) -> usize {
        self.eligible.div_ceil(self.max_size)
    }
}

impl Iterator for Batcher {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        let keys: Vec<LookupKey> = self.pending.by_ref().take(self.max_size).collect();
        if keys.is_empty() {
            return None;
        }
        let batch = Batch::new(self.next_seq, keys);
        self.next_seq += 1;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.pending.len().div_ceil(self.max_size);
        (remaining, Some(remaining))
    }
}
