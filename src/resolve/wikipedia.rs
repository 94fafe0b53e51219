//! Existence check against the MediaWiki Action API
//!
//! One `action=query` request per batch, titles pipe-joined, with redirect
//! resolution requested. The response's `normalized` and `redirects` lists
//! are folded into a [`ResponseAliasMap`] before matching pages back onto the
//! requested titles.

use super::alias::ResponseAliasMap;
use super::traits::{BatchResolver, ResolveError};
use crate::config::SourceConfig;
use crate::model::{Batch, BatchOutcomes, Outcome};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::debug;

/// Upper bound on titles per `action=query` call for non-bot clients.
pub const MAX_TITLES_PER_QUERY: usize = 50;

/// Top-level `action=query&format=json` response
#[derive(Debug, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub query: Option<QueryBody>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QueryBody {
    #[serde(default)]
    pub normalized: Vec<TitleAlias>,
    #[serde(default)]
    pub redirects: Vec<TitleAlias>,
    /// Keyed by page id; missing and invalid titles get negative ids
    #[serde(default)]
    pub pages: HashMap<String, Page>,
}

/// One `from` → `to` entry of the `normalized` or `redirects` list
#[derive(Debug, Clone, Deserialize)]
pub struct TitleAlias {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub code: String,
    #[serde(default)]
    pub info: String,
}

impl QueryBody {
    /// Normalization first, then redirects.
    pub fn alias_map(&self) -> ResponseAliasMap {
        let mut aliases = ResponseAliasMap::new();
        for alias in &self.normalized {
            aliases.add_normalization(&alias.from, &alias.to);
        }
        for alias in &self.redirects {
            aliases.add_redirect(&alias.from, &alias.to);
        }
        aliases
    }

    /// Titles of pages with a positive id.
    pub fn existing_titles(&self) -> Result<HashSet<&str>, ResolveError> {
        let mut existing = HashSet::new();
        for (id, page) in &self.pages {
            let page_id: i64 = id
                .parse()
                .map_err(|_| ResolveError::Malformed(format!("non-integer page id '{}'", id)))?;
            if page_id > 0 {
                existing.insert(page.title.as_str());
            }
        }
        Ok(existing)
    }
}

/// Classify every key of `batch` against a decoded response.
///
/// API errors and a missing `query` object are failures, never `MISSING`.
pub fn classify_existence(
    batch: &Batch,
    response: &QueryResponse,
) -> Result<BatchOutcomes, ResolveError> {
    if let Some(err) = &response.error {
        return Err(ResolveError::Api {
            code: err.code.clone(),
            info: err.info.clone(),
        });
    }
    let body = match &response.query {
        Some(body) => body,
        None if batch.is_empty() => return Ok(BatchOutcomes::new()),
        None => return Err(ResolveError::Malformed("response has no 'query' object".into())),
    };

    let aliases = body.alias_map();
    let existing = body.existing_titles()?;

    Ok(batch
        .iter()
        .map(|key| {
            let outcome = if existing.contains(aliases.resolve(key.as_str())) {
                Outcome::Exists
            } else {
                Outcome::Missing
            };
            (key.clone(), outcome)
        })
        .collect())
}

/// Resolver for "does an article with this title exist"
pub struct WikipediaResolver {
    client: Client,
    endpoint: String,
}

impl WikipediaResolver {
    pub fn new(source: &SourceConfig) -> Result<Self, ResolveError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(source.timeout_secs))
            .user_agent(source.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            endpoint: source.endpoint.clone(),
        })
    }
}

#[async_trait]
impl BatchResolver for WikipediaResolver {
    fn id(&self) -> &str {
        "wikipedia"
    }

    async fn resolve(&self, batch: &Batch) -> Result<BatchOutcomes, ResolveError> {
        let titles = batch
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join("|");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("titles", titles.as_str()),
                ("format", "json"),
                ("redirects", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        let decoded: QueryResponse = serde_json::from_str(&text)?;
        debug!(batch = batch.seq(), keys = batch.len(), "wikipedia batch decoded");
        classify_existence(batch, &decoded)
    }
}
