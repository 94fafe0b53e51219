//! Shared fixtures for mesh-enrich integration tests

#![allow(dead_code)]

use mesh_enrich::{
    BatchOutcomes, CheckpointError, CheckpointResult, CheckpointStore, LookupKey, Snapshot, Table,
};
use std::path::Path;

/// Filtered-vocabulary rows: uid, name, topic, tree_numbers
pub const FILTERED_ROWS: &[[&str; 4]] = &[
    ["D001241", "Aspirin", "Chemicals and Drugs", "D02.455.426"],
    ["D005334", "Fever", "Diseases", "C23.888.119"],
    ["D999001", "Xyzzy123NotReal", "Diseases", "C01.100"],
    ["D999002", "Foo", "Anatomy", "A01.236"],
    ["D001769", "Blood", "Anatomy", "A12.207;A15.145"],
    ["D999003", "Glorbulin", "Chemicals and Drugs", "D12.776"],
    ["D009369", "Neoplasms", "Diseases", "C04"],
];

/// Titles the scripted upstream knows as articles
pub const EXISTING_TITLES: &[&str] = &["Aspirin", "Fever", "Bar", "Blood", "Neoplasms"];

pub fn filtered_table() -> Table {
    let mut table = Table::new(["uid", "name", "topic", "tree_numbers"]);
    for row in FILTERED_ROWS {
        table.push_row(*row);
    }
    table
}

pub fn write_filtered_csv(path: &Path) {
    filtered_table().write(path).expect("write fixture CSV");
}

pub fn keys(names: &[&str]) -> Vec<LookupKey> {
    names.iter().map(|n| LookupKey::from(*n)).collect()
}

/// Many synthetic keys, for runs spanning dozens of batches
pub fn numbered_keys(n: usize) -> Vec<LookupKey> {
    (0..n).map(|i| LookupKey::new(format!("D{:06}", i))).collect()
}

/// Store wrapper whose flushes start failing after a set number succeed,
/// standing in for a process killed mid-run.
pub struct DyingStore<S> {
    inner: S,
    flushes_left: usize,
}

impl<S: CheckpointStore> DyingStore<S> {
    pub fn new(inner: S, successful_flushes: usize) -> Self {
        Self {
            inner,
            flushes_left: successful_flushes,
        }
    }
}

impl<S: CheckpointStore> CheckpointStore for DyingStore<S> {
    fn load(&mut self) -> CheckpointResult<&Snapshot> {
        self.inner.load()
    }

    fn snapshot(&self) -> &Snapshot {
        self.inner.snapshot()
    }

    fn merge(&mut self, outcomes: BatchOutcomes) {
        self.inner.merge(outcomes);
    }

    fn flush(&mut self) -> CheckpointResult<()> {
        if self.flushes_left == 0 {
            return Err(CheckpointError::Io {
                path: "<dying store>".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "process killed"),
            });
        }
        self.flushes_left -= 1;
        self.inner.flush()
    }
}
