//! BatchResolver trait: the contract upstream integrations implement

use crate::model::{Batch, BatchOutcomes};
use async_trait::async_trait;
use thiserror::Error;

/// A failed upstream call. Always transient from the pipeline's point of
/// view: it is retried, and never classified as a business outcome.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("upstream API error {code}: {info}")]
    Api { code: String, info: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for ResolveError {
    fn from(err: serde_json::Error) -> Self {
        ResolveError::Malformed(err.to_string())
    }
}

/// Turns one batch into per-key outcomes with exactly one upstream call.
///
/// Either every key of the batch is classified or the call fails as a whole;
/// there is no partial crediting. Retrying is the caller's concern.
#[async_trait]
pub trait BatchResolver: Send + Sync {
    /// Stable identifier used in log lines
    fn id(&self) -> &str;

    async fn resolve(&self, batch: &Batch) -> Result<BatchOutcomes, ResolveError>;
}
