//! Snapshot, Batch, and BatchOutcomes

use super::key::LookupKey;
use super::outcome::Outcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Durable mapping of every key resolved so far to its outcome.
///
/// Ordered so that two identical runs serialize to identical bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    entries: BTreeMap<LookupKey, Outcome>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Outcome> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A key is eligible for (re)resolution if it was never recorded or its
    /// last outcome is retryable.
    pub fn is_eligible(&self, key: &str) -> bool {
        self.entries.get(key).map_or(true, Outcome::is_retryable)
    }

    /// Insert or overwrite every outcome of one batch. Returns the number of
    /// keys written.
    pub fn merge(&mut self, outcomes: BatchOutcomes) -> usize {
        let written = outcomes.len();
        self.entries.extend(outcomes.0);
        written
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LookupKey, &Outcome)> {
        self.entries.iter()
    }

    /// Tally outcomes by kind.
    pub fn counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts::default();
        for outcome in self.entries.values() {
            counts.record(outcome);
        }
        counts
    }
}

impl FromIterator<(LookupKey, Outcome)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (LookupKey, Outcome)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Per-kind outcome tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub exists: usize,
    pub missing: usize,
    pub error: usize,
    /// Keys with a non-empty linked identifier
    pub linked: usize,
    /// Keys checked for a link and found to have none
    pub unlinked: usize,
}

impl OutcomeCounts {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Exists => self.exists += 1,
            Outcome::Missing => self.missing += 1,
            Outcome::Error => self.error += 1,
            Outcome::Linked(id) if id.is_empty() => self.unlinked += 1,
            Outcome::Linked(_) => self.linked += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.exists + self.missing + self.error + self.linked + self.unlinked
    }
}

/// An ordered, size-bounded group of unresolved keys sent in one upstream call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// 1-based position of this batch within its run
    seq: usize,
    keys: Vec<LookupKey>,
}

impl Batch {
    pub fn new(seq: usize, keys: Vec<LookupKey>) -> Self {
        Self { seq, keys }
    }

    pub fn seq(&self) -> usize {
        self.seq
    }

    pub fn keys(&self) -> &[LookupKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LookupKey> {
        self.keys.iter()
    }
}

/// Outcomes for the keys of exactly one batch.
///
/// Merged into a [`Snapshot`] as a unit; never partially applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcomes(BTreeMap<LookupKey, Outcome>);

impl BatchOutcomes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the same outcome to every key of a batch.
    pub fn uniform(batch: &Batch, outcome: Outcome) -> Self {
        batch
            .iter()
            .map(|key| (key.clone(), outcome.clone()))
            .collect()
    }

    pub fn insert(&mut self, key: LookupKey, outcome: Outcome) {
        self.0.insert(key, outcome);
    }

    pub fn get(&self, key: &str) -> Option<&Outcome> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LookupKey, &Outcome)> {
        self.0.iter()
    }
}

impl FromIterator<(LookupKey, Outcome)> for BatchOutcomes {
    fn from_iter<I: IntoIterator<Item = (LookupKey, Outcome)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
