//! Upstream resolvers
//!
//! A resolver turns one batch into per-key outcomes with a single upstream
//! call. `WikipediaResolver` answers existence questions, `WikidataResolver`
//! answers linked-id questions, and `MockResolver` answers from a table.

mod alias;
mod mock;
#[cfg(test)]
mod stub;
mod traits;
pub mod wikidata;
pub mod wikipedia;

pub use alias::ResponseAliasMap;
pub use mock::MockResolver;
pub use traits::{BatchResolver, ResolveError};
pub use wikidata::WikidataResolver;
pub use wikipedia::WikipediaResolver;
