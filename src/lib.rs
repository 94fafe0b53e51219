//! mesh-enrich: resumable batched lookups for controlled vocabularies
//!
//! Enriches MeSH descriptor terms with upstream facts, one bounded batch per
//! request: whether an encyclopedia article exists for a term's name, and
//! which knowledge-base entity links to a term's identifier.
//!
//! # Core Concepts
//!
//! - **Snapshot**: the key → outcome map persisted as a checkpoint; only keys
//!   without a final outcome are looked up again
//! - **Resolver**: one upstream call per batch, reconciling redirected or
//!   normalized names back to the keys that were asked for
//! - **Pipeline**: the sequential loop adding retry, pacing and periodic
//!   flushes around a resolver
//!
//! # Example
//!
//! ```
//! use mesh_enrich::{LookupKey, MemoryStore, MockResolver, Pipeline, RunSettings};
//!
//! # tokio_test::block_on(async {
//! let resolver = MockResolver::existence(["Aspirin"]);
//! let mut store = MemoryStore::new();
//! let keys = vec![LookupKey::from("Aspirin"), LookupKey::from("Xyzzy")];
//!
//! let summary = Pipeline::new(&resolver, RunSettings::immediate(50))
//!     .run(&keys, &mut store)
//!     .await
//!     .unwrap();
//! assert_eq!(summary.counts.exists, 1);
//! # });
//! ```

pub mod config;
mod model;
pub mod pipeline;
pub mod resolve;
pub mod storage;
pub mod vocab;

pub use config::{Config, ConfigError, SourceConfig};
pub use model::{Batch, BatchOutcomes, LookupKey, Outcome, OutcomeCounts, Snapshot};
pub use pipeline::{
    Backoff, CancellationToken, Pass, Pipeline, RateGovernor, RetryPolicy, RunSettings, RunSummary,
};
pub use resolve::{
    BatchResolver, MockResolver, ResolveError, ResponseAliasMap, WikidataResolver,
    WikipediaResolver,
};
pub use storage::{CheckpointError, CheckpointResult, CheckpointStore, JsonFileStore, MemoryStore};
pub use vocab::{Report, ReportOptions, Summary, Table, TitleFilter, VocabError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
