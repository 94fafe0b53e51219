//! Checkpoint store trait definitions

use crate::model::{BatchOutcomes, Snapshot};
use thiserror::Error;

/// Errors that can occur while reading or writing a checkpoint
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error on checkpoint {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Checkpoint {path} is not a valid key/outcome object: {source}")]
    Serialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Owner of the run's snapshot and its durable copy.
///
/// The store is owned by the single control thread for the whole run, so
/// methods take `&mut self` and no locking is involved.
pub trait CheckpointStore: Send {
    /// Read the durable snapshot into memory, replacing any in-memory state.
    ///
    /// Absent storage yields an empty snapshot, never an error.
    fn load(&mut self) -> CheckpointResult<&Snapshot>;

    /// The current in-memory snapshot
    fn snapshot(&self) -> &Snapshot;

    /// Apply one batch's outcomes in full. Touches memory only.
    fn merge(&mut self, outcomes: BatchOutcomes);

    /// Replace the durable copy with the in-memory snapshot.
    ///
    /// Safe to call repeatedly. An interrupted flush leaves the previous
    /// durable copy intact.
    fn flush(&mut self) -> CheckpointResult<()>;
}
