//! Scripted in-process endpoint for testing discovery without a network

use super::{Row, SparqlTransport, TransportOutcome};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// How a rule answers a matching query
#[derive(Debug)]
enum MockResponse {
    /// Serve these rows, honouring the query's `LIMIT`/`OFFSET`
    Rows(Vec<Row>),
    /// Serve rows, but reject any page larger than `max_page`
    PageCap { max_page: usize, rows: Vec<Row> },
    /// Reject every request
    Reject,
    /// Hand out the queued outcomes in order, then empty row sets
    Script(Mutex<VecDeque<TransportOutcome>>),
}

#[derive(Debug)]
struct MockRule {
    fragments: Vec<String>,
    response: MockResponse,
}

impl MockRule {
    fn matches(&self, query: &str) -> bool {
        self.fragments.iter().all(|f| query.contains(f.as_str()))
    }
}

/// Mock transport for testing: answers queries from preconfigured rules.
///
/// A rule matches when the query contains all of its fragments; the first
/// matching rule wins. Unmatched queries get an empty row set. Every query
/// is recorded, in order, for later assertions.
#[derive(Debug, Default)]
pub struct MockTransport {
    rules: Vec<MockRule>,
    log: Mutex<Vec<String>>,
    latency: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `rows` to queries containing every fragment
    pub fn with_rows(self, fragments: &[&str], rows: Vec<Row>) -> Self {
        self.with_rule(fragments, MockResponse::Rows(rows))
    }

    /// Serve `rows`, rejecting pages larger than `max_page`
    pub fn with_page_cap(self, fragments: &[&str], max_page: usize, rows: Vec<Row>) -> Self {
        self.with_rule(fragments, MockResponse::PageCap { max_page, rows })
    }

    /// Reject every query containing every fragment
    pub fn with_rejection(self, fragments: &[&str]) -> Self {
        self.with_rule(fragments, MockResponse::Reject)
    }

    /// Answer matching queries with `outcomes`, one per request
    pub fn with_script(self, fragments: &[&str], outcomes: Vec<TransportOutcome>) -> Self {
        self.with_rule(fragments, MockResponse::Script(Mutex::new(outcomes.into())))
    }

    /// Delay every answer, like a slow endpoint
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn with_rule(mut self, fragments: &[&str], response: MockResponse) -> Self {
        self.rules.push(MockRule {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            response,
        });
        self
    }

    /// All queries received so far
    pub fn queries(&self) -> Vec<String> {
        lock(&self.log).clone()
    }

    /// Queries received so far that contain `fragment`
    pub fn queries_containing(&self, fragment: &str) -> Vec<String> {
        lock(&self.log)
            .iter()
            .filter(|q| q.contains(fragment))
            .cloned()
            .collect()
    }

    pub fn query_count(&self) -> usize {
        lock(&self.log).len()
    }
}

#[async_trait]
impl SparqlTransport for MockTransport {
    async fn execute(&self, query: &str, _endpoint: &str) -> TransportOutcome {
        lock(&self.log).push(query.to_string());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let Some(rule) = self.rules.iter().find(|r| r.matches(query)) else {
            return TransportOutcome::Rows(Vec::new());
        };

        let (limit, offset) = parse_window(query);
        match &rule.response {
            MockResponse::Rows(rows) => TransportOutcome::Rows(page(rows, limit, offset)),
            MockResponse::PageCap { max_page, rows } => match limit {
                Some(limit) if limit > *max_page => TransportOutcome::Rejected,
                _ => TransportOutcome::Rows(page(rows, limit, offset)),
            },
            MockResponse::Reject => TransportOutcome::Rejected,
            MockResponse::Script(queue) => lock(queue)
                .pop_front()
                .unwrap_or(TransportOutcome::Rows(Vec::new())),
        }
    }
}

/// Routes each query to the mock registered for its endpoint.
///
/// Queries to an unrouted endpoint are recorded and get an empty row set.
#[derive(Debug, Default)]
pub struct MockRouter {
    routes: HashMap<String, Arc<MockTransport>>,
    unrouted: Mutex<Vec<String>>,
}

impl MockRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, endpoint: impl Into<String>, mock: Arc<MockTransport>) -> Self {
        self.routes.insert(endpoint.into(), mock);
        self
    }

    /// Endpoints that received a query without a route
    pub fn unrouted(&self) -> Vec<String> {
        lock(&self.unrouted).clone()
    }
}

#[async_trait]
impl SparqlTransport for MockRouter {
    async fn execute(&self, query: &str, endpoint: &str) -> TransportOutcome {
        match self.routes.get(endpoint) {
            Some(mock) => mock.execute(query, endpoint).await,
            None => {
                lock(&self.unrouted).push(endpoint.to_string());
                TransportOutcome::Rows(Vec::new())
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn page(rows: &[Row], limit: Option<usize>, offset: usize) -> Vec<Row> {
    rows.iter()
        .skip(offset)
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect()
}

/// Read the trailing `LIMIT n [OFFSET k]` window of a query
fn parse_window(query: &str) -> (Option<usize>, usize) {
    let value_after = |keyword: &str| {
        query
            .rfind(keyword)
            .and_then(|pos| query[pos + keyword.len()..].split_whitespace().next())
            .and_then(|n| n.parse::<usize>().ok())
    };
    (value_after(" LIMIT "), value_after(" OFFSET ").unwrap_or(0))
}
