//! Batch scheduling and the resumable run loop

mod batcher;
mod cancel;
mod governor;
mod retry;
mod runner;

pub use batcher::Batcher;
pub use cancel::CancellationToken;
pub use governor::RateGovernor;
pub use retry::{Attempted, Backoff, RetryPolicy};
pub use runner::{Pass, Pipeline, RunSettings, RunSummary};
