//! Query transport: the boundary between discovery and a live endpoint
//!
//! Discovery never talks HTTP directly. It hands a query string and an
//! endpoint address to a [`SparqlTransport`] and gets back rows, a boolean,
//! or a rejection. Two implementations:
//! - `HttpTransport`: SPARQL protocol over HTTP (production)
//! - `MockTransport`: scripted in-process endpoint (testing), with
//!   `MockRouter` to put several behind distinct endpoint addresses

mod http;
mod mock;

pub use http::{HttpTransport, TransportError};
pub use mock::{MockRouter, MockTransport};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One result row: variable name → rendered value
///
/// Literals are rendered as `value`, `value^^<datatype>` or `value@lang`.
pub type Row = HashMap<String, String>;

/// Row count reported for a rejected query
pub const REJECTED_ROW_COUNT: i64 = -2;

/// What an endpoint answered
#[derive(Debug, Clone, PartialEq)]
pub enum TransportOutcome {
    /// A (possibly empty) row set
    Rows(Vec<Row>),
    /// Answer to an `ASK` query
    Boolean(bool),
    /// The source refused or failed the query, typically because the
    /// requested result is too large
    Rejected,
}

impl TransportOutcome {
    /// Row count in the transport contract's terms (`-2` for rejections)
    pub fn row_count(&self) -> i64 {
        match self {
            Self::Rows(rows) => rows.len() as i64,
            Self::Boolean(_) => 1,
            Self::Rejected => REJECTED_ROW_COUNT,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected)
    }
}

/// Executes query text against an endpoint
///
/// Implementations are responsible for retrying once on a failed request and
/// for collapsing any remaining failure into [`TransportOutcome::Rejected`].
#[async_trait]
pub trait SparqlTransport: Send + Sync {
    async fn execute(&self, query: &str, endpoint: &str) -> TransportOutcome;
}

/// Settings for the HTTP transport
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 120,
            user_agent: format!("rdfmt/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Build a [`Row`] from `(variable, value)` pairs
pub fn row<I, K, V>(pairs: I) -> Row
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
