//! Checkpoint storage backends
//!
//! Progress is persisted through the `CheckpointStore` trait. `JsonFileStore`
//! is the on-disk backend; `MemoryStore` backs tests.

mod json;
mod memory;
mod traits;

pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use traits::{CheckpointError, CheckpointResult, CheckpointStore};
