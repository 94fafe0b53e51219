//! Scripted resolver for tests

use super::alias::ResponseAliasMap;
use super::traits::{BatchResolver, ResolveError};
use crate::model::{Batch, BatchOutcomes, LookupKey, Outcome};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Answers {
    /// Existence check: canonical names that exist, plus aliases
    Existence {
        existing: HashSet<String>,
        aliases: ResponseAliasMap,
    },
    /// Linked-id lookup: id → linked identifier
    Linked(HashMap<String, String>),
}

/// Resolver answering from an in-memory table.
///
/// Failures can be scripted by call count (`failing_first`, `always_failing`)
/// or by key (`unreachable`): any batch containing an unreachable key fails
/// as a whole. Every requested batch is recorded for inspection.
pub struct MockResolver {
    answers: Answers,
    fail_first: usize,
    unreachable: HashSet<String>,
    calls: AtomicUsize,
    requested: Mutex<Vec<Vec<LookupKey>>>,
}

impl MockResolver {
    fn with_answers(answers: Answers) -> Self {
        Self {
            answers,
            fail_first: 0,
            unreachable: HashSet::new(),
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Existence resolver where exactly `existing` titles exist.
    pub fn existence<'a>(existing: impl IntoIterator<Item = &'a str>) -> Self {
        Self::with_answers(Answers::Existence {
            existing: existing.into_iter().map(str::to_string).collect(),
            aliases: ResponseAliasMap::new(),
        })
    }

    /// Linked-id resolver with the given id → link table.
    pub fn linked<'a>(links: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self::with_answers(Answers::Linked(
            links
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ))
    }

    /// Aliases applied before existence matching (ignored for linked ids).
    pub fn with_aliases(mut self, map: ResponseAliasMap) -> Self {
        if let Answers::Existence { aliases, .. } = &mut self.answers {
            *aliases = map;
        }
        self
    }

    /// Fail the first `n` calls, then answer normally.
    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    /// Fail every call.
    pub fn always_failing(self) -> Self {
        self.failing_first(usize::MAX)
    }

    /// Fail any batch that contains one of `keys`.
    pub fn unreachable<'a>(mut self, keys: impl IntoIterator<Item = &'a str>) -> Self {
        self.unreachable.extend(keys.into_iter().map(str::to_string));
        self
    }

    /// Total `resolve` calls so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Keys of every requested batch, in call order.
    pub fn requested(&self) -> Vec<Vec<LookupKey>> {
        self.requested
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn answer(&self, key: &LookupKey) -> Outcome {
        match &self.answers {
            Answers::Existence { existing, aliases } => {
                if existing.contains(aliases.resolve(key.as_str())) {
                    Outcome::Exists
                } else {
                    Outcome::Missing
                }
            }
            Answers::Linked(links) => {
                Outcome::Linked(links.get(key.as_str()).cloned().unwrap_or_default())
            }
        }
    }
}

#[async_trait]
impl BatchResolver for MockResolver {
    fn id(&self) -> &str {
        "mock"
    }

    async fn resolve(&self, batch: &Batch) -> Result<BatchOutcomes, ResolveError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(batch.keys().to_vec());
        }

        if call < self.fail_first {
            return Err(ResolveError::Status(503));
        }
        if batch.iter().any(|k| self.unreachable.contains(k.as_str())) {
            return Err(ResolveError::Malformed("scripted failure".into()));
        }

        Ok(batch.iter().map(|k| (k.clone(), self.answer(k))).collect())
    }
}
