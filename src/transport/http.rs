//! SPARQL protocol client over HTTP

use super::{Row, SparqlTransport, TransportConfig, TransportOutcome};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, REFERER};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Attempts per query: the first request plus one retry
const MAX_ATTEMPTS: usize = 2;

/// Errors from a single HTTP exchange
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("endpoint answered {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("cannot decode results: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Transport that speaks the SPARQL 1.1 protocol (GET, JSON results)
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    async fn request(&self, query: &str, endpoint: &str) -> Result<TransportOutcome, TransportError> {
        let url = normalize_endpoint(endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[("query", query), ("format", SPARQL_RESULTS_JSON)])
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .header(REFERER, endpoint)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        let body = response.text().await?;
        decode_results(&body)
    }
}

#[async_trait]
impl SparqlTransport for HttpTransport {
    async fn execute(&self, query: &str, endpoint: &str) -> TransportOutcome {
        for attempt in 1..=MAX_ATTEMPTS {
            match self.request(query, endpoint).await {
                Ok(outcome) => {
                    debug!(endpoint, rows = outcome.row_count(), "query answered");
                    return outcome;
                }
                Err(e) => warn!(endpoint, attempt, error = %e, "query failed"),
            }
        }
        TransportOutcome::Rejected
    }
}

/// `0.0.0.0` is a bind address, not something a client can reach
fn normalize_endpoint(endpoint: &str) -> String {
    endpoint.replacen("://0.0.0.0", "://localhost", 1)
}

#[derive(Debug, Deserialize)]
struct ResultsDocument {
    #[serde(default)]
    results: Option<ResultBindings>,
    #[serde(default)]
    boolean: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ResultBindings {
    bindings: Vec<HashMap<String, BoundValue>>,
}

#[derive(Debug, Deserialize)]
struct BoundValue {
    #[serde(rename = "type")]
    kind: String,
    value: String,
    #[serde(default)]
    datatype: Option<String>,
    #[serde(rename = "xml:lang", alias = "lang", default)]
    lang: Option<String>,
}

impl BoundValue {
    fn render(self) -> String {
        let is_literal = self.kind == "literal" || self.kind == "typed-literal";
        match (is_literal, self.datatype, self.lang) {
            (true, Some(datatype), _) => format!("{}^^<{}>", self.value, datatype),
            (true, None, Some(lang)) => format!("{}@{}", self.value, lang),
            (_, _, _) => self.value,
        }
    }
}

/// Decode a SPARQL JSON results document into a transport outcome
pub(crate) fn decode_results(body: &str) -> Result<TransportOutcome, TransportError> {
    let document: ResultsDocument = serde_json::from_str(body)?;

    if let Some(results) = document.results {
        let rows: Vec<Row> = results
            .bindings
            .into_iter()
            .map(|binding| {
                binding
                    .into_iter()
                    .map(|(var, value)| (var, value.render()))
                    .collect()
            })
            .collect();
        return Ok(TransportOutcome::Rows(rows));
    }

    Ok(TransportOutcome::Boolean(document.boolean.unwrap_or(false)))
}
