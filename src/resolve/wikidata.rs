//! Linked-id lookup against the Wikidata SPARQL endpoint
//!
//! One `VALUES` query per batch asks for every item carrying a batch id as
//! its MeSH descriptor id (P486). Ids with no match are simply absent from
//! the result set, so absence is recorded as an empty link.

use super::traits::{BatchResolver, ResolveError};
use crate::config::SourceConfig;
use crate::model::{Batch, BatchOutcomes, Outcome};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Wikidata property holding the MeSH descriptor id
pub const MESH_DESCRIPTOR_PROPERTY: &str = "P486";

const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// SPARQL 1.1 JSON results document
#[derive(Debug, Deserialize)]
pub struct SparqlResponse {
    pub results: SparqlResults,
}

#[derive(Debug, Default, Deserialize)]
pub struct SparqlResults {
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

/// One solution row: the matched item and the id it was matched on
#[derive(Debug, Clone, Deserialize)]
pub struct Binding {
    pub item: Term,
    #[serde(rename = "meshId")]
    pub mesh_id: Term,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Term {
    pub value: String,
}

/// Build the `VALUES` query for one batch.
pub fn build_query(batch: &Batch) -> String {
    let values = batch
        .iter()
        .map(|k| sparql_literal(k.as_str()))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "SELECT ?item ?meshId WHERE {{\n  VALUES ?meshId {{ {} }}\n  ?item wdt:{} ?meshId .\n}}",
        values, MESH_DESCRIPTOR_PROPERTY
    )
}

fn sparql_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Entity id from an item IRI (`http://www.wikidata.org/entity/Q42` → `Q42`).
fn entity_id(iri: &str) -> Option<&str> {
    iri.rsplit('/').next().filter(|id| !id.is_empty())
}

/// Orders `Q9` before `Q10`.
fn entity_rank(id: &str) -> (usize, &str) {
    (id.len(), id)
}

/// Map a decoded result set back onto the batch.
///
/// Every batch key gets an outcome: its linked id, or an empty link when the
/// result set has no row for it. When one id is linked to several items the
/// lowest entity number wins. Rows for ids outside the batch are ignored.
pub fn map_linked_ids(
    batch: &Batch,
    response: &SparqlResponse,
) -> Result<BatchOutcomes, ResolveError> {
    let mut found: HashMap<&str, &str> = HashMap::new();
    for binding in &response.results.bindings {
        let id = entity_id(&binding.item.value).ok_or_else(|| {
            ResolveError::Malformed(format!("item IRI '{}' has no entity id", binding.item.value))
        })?;
        found
            .entry(binding.mesh_id.value.as_str())
            .and_modify(|current| {
                if entity_rank(id) < entity_rank(*current) {
                    *current = id;
                }
            })
            .or_insert(id);
    }

    Ok(batch
        .iter()
        .map(|key| {
            let linked = found.get(key.as_str()).copied().unwrap_or_default();
            (key.clone(), Outcome::Linked(linked.to_string()))
        })
        .collect())
}

/// Resolver for "which Wikidata item, if any, carries this descriptor id"
pub struct WikidataResolver {
    client: Client,
    endpoint: String,
}

impl WikidataResolver {
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
impl BatchResolver for WikidataResolver {
    fn id(&self) -> &str {
        "wikidata"
    }

    async fn resolve(&self, batch: &Batch) -> Result<BatchOutcomes, ResolveError> {
        let query = build_query(batch);

        let response = self
            .client
            .get(&self.endpoint)
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .query(&[("query", query.as_str()), ("format", "json")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        let decoded: SparqlResponse = serde_json::from_str(&text)?;
        debug!(
            batch = batch.seq(),
            keys = batch.len(),
            rows = decoded.results.bindings.len(),
            "wikidata batch decoded"
        );
        map_linked_ids(batch, &decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LookupKey;
    use crate::pipeline::{Backoff, RetryPolicy};
    use crate::resolve::stub;
    use serde_json::json;

    fn batch(keys: &[&str]) -> Batch {
        Batch::new(1, keys.iter().map(|k| LookupKey::from(*k)).collect())
    }

    /// Resolver against a loopback stub, ignoring any proxy in the environment.
    fn local(endpoint: String) -> WikidataResolver {
        WikidataResolver {
            client: Client::builder()
                .no_proxy()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap(),
            endpoint,
        }
    }

    fn row(qid: &str, mesh: &str) -> serde_json::Value {
        json!({
            "item": {"type": "uri", "value": format!("http://www.wikidata.org/entity/{}", qid)},
            "meshId": {"type": "literal", "value": mesh}
        })
    }

    fn decode(rows: Vec<serde_json::Value>) -> SparqlResponse {
        serde_json::from_value(json!({
            "head": {"vars": ["item", "meshId"]},
            "results": {"bindings": rows}
        }))
        .unwrap()
    }

    #[test]
    fn query_lists_every_batch_id_as_literal() {
        let query = build_query(&batch(&["D000001", "D000002"]));

        assert!(query.contains(r#"VALUES ?meshId { "D000001" "D000002" }"#));
        assert!(query.contains("?item wdt:P486 ?meshId ."));
    }

    #[test]
    fn literals_are_escaped() {
        assert_eq!(sparql_literal(r#"a"b\c"#), r#""a\"b\\c""#);
    }

    #[test]
    fn absent_ids_map_to_empty_link() {
        let response = decode(vec![row("Q411065", "D000001")]);

        let outcomes = map_linked_ids(&batch(&["D000001", "D000002"]), &response).unwrap();

        assert_eq!(outcomes.get("D000001"), Some(&Outcome::Linked("Q411065".into())));
        assert_eq!(outcomes.get("D000002"), Some(&Outcome::Linked(String::new())));
    }

    #[test]
    fn lowest_entity_number_wins_for_duplicate_links() {
        let response = decode(vec![
            row("Q100", "D000001"),
            row("Q9", "D000001"),
            row("Q55", "D000001"),
        ]);

        let outcomes = map_linked_ids(&batch(&["D000001"]), &response).unwrap();
        assert_eq!(outcomes.get("D000001"), Some(&Outcome::Linked("Q9".into())));
    }

    #[test]
    fn rows_outside_batch_are_ignored() {
        let response = decode(vec![row("Q1", "D999999")]);

        let outcomes = map_linked_ids(&batch(&["D000001"]), &response).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes.get("D999999"), None);
    }

    #[test]
    fn missing_results_object_is_malformed() {
        let err: ResolveError = serde_json::from_value::<SparqlResponse>(json!({"head": {}}))
            .map_err(ResolveError::from)
            .unwrap_err();
        assert!(matches!(err, ResolveError::Malformed(_)));
    }

    #[test]
    fn item_without_entity_id_is_malformed() {
        let response = decode(vec![json!({
            "item": {"type": "uri", "value": "http://www.wikidata.org/entity/"},
            "meshId": {"type": "literal", "value": "D000001"}
        })]);

        let err = map_linked_ids(&batch(&["D000001"]), &response).unwrap_err();
        assert!(matches!(err, ResolveError::Malformed(_)));
    }

    #[tokio::test]
    async fn service_unavailable_is_a_status_error() {
        let endpoint = stub::serve(503, "Service Unavailable", "text/plain", "busy", 1).await;
        let resolver = local(endpoint);

        let err = resolver.resolve(&batch(&["D001241"])).await.unwrap_err();
        assert!(matches!(err, ResolveError::Status(503)));
    }

    #[tokio::test]
    async fn html_body_with_ok_status_is_malformed() {
        let endpoint = stub::serve(200, "OK", "text/html", "<html>x</html>", 1).await;
        let resolver = local(endpoint);

        let err = resolver.resolve(&batch(&["D001241"])).await.unwrap_err();
        assert!(matches!(err, ResolveError::Malformed(_)));
    }

    #[tokio::test]
    async fn persistent_outage_records_error_not_unlinked() {
        let endpoint = stub::serve(503, "Service Unavailable", "text/plain", "busy", 2).await;
        let resolver = local(endpoint);
        let policy = RetryPolicy::new(2, Backoff::Fixed { delay_ms: 0 });

        let attempted = policy
            .resolve_with_retry(&resolver, &batch(&["D001241", "D999999"]))
            .await;

        assert!(attempted.exhausted);
        assert_eq!(attempted.outcomes.get("D001241"), Some(&Outcome::Error));
        assert_eq!(attempted.outcomes.get("D999999"), Some(&Outcome::Error));
    }
}
