//! Core lookup data structures

mod key;
mod outcome;
mod snapshot;

#[cfg(test)]
mod tests;

pub use key::LookupKey;
pub use outcome::Outcome;
pub use snapshot::{Batch, BatchOutcomes, OutcomeCounts, Snapshot};
