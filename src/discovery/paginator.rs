//! Paginated query execution with adaptive page-size backoff
//!
//! A logical query is issued as a sequence of `LIMIT`/`OFFSET` requests.
//! When the source rejects a page, the page size is halved and the same
//! offset is retried; pages are never skipped. Once the page size would drop
//! below one the query is reported as failed.

use crate::transport::{Row, SparqlTransport, TransportOutcome};
use tracing::{debug, warn};

/// Whether a paginated query ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Complete,
    /// The source kept rejecting the query down to a page size of one
    Failed,
}

/// Rows collected by a paginated query
#[derive(Debug, Clone, PartialEq)]
pub struct PagedResult {
    /// Rows from every page fetched before completion or failure
    pub rows: Vec<Row>,
    pub status: PageStatus,
    /// Number of requests sent
    pub requests: usize,
}

impl PagedResult {
    pub fn is_failed(&self) -> bool {
        self.status == PageStatus::Failed
    }
}

/// Issues one logical query as a sequence of bounded requests
pub struct Paginator<'a> {
    transport: &'a dyn SparqlTransport,
    endpoint: &'a str,
}

impl<'a> Paginator<'a> {
    pub fn new(transport: &'a dyn SparqlTransport, endpoint: &'a str) -> Self {
        Self { transport, endpoint }
    }

    /// Fetch every row of `query`, starting with pages of `page_size`
    pub async fn fetch_all(&self, query: &str, page_size: usize) -> PagedResult {
        self.fetch(query, page_size, None).await
    }

    /// Fetch rows of `query`, stopping once `max_rows` have been collected
    ///
    /// The result never holds more than `max_rows` rows.
    pub async fn fetch(&self, query: &str, page_size: usize, max_rows: Option<usize>) -> PagedResult {
        let mut limit = page_size.max(1);
        let mut offset = 0usize;
        let mut rows: Vec<Row> = Vec::new();
        let mut requests = 0usize;
        // Halving reaches zero after exactly this many rejections
        let mut backoffs_left = usize::BITS - limit.leading_zeros();

        let status = loop {
            let request = paged_query(query, limit, offset);
            requests += 1;

            let page = match self.transport.execute(&request, self.endpoint).await {
                TransportOutcome::Rows(page) => page,
                TransportOutcome::Boolean(_) => break PageStatus::Complete,
                TransportOutcome::Rejected => {
                    backoffs_left = backoffs_left.saturating_sub(1);
                    limit /= 2;
                    if limit < 1 || backoffs_left == 0 {
                        warn!(endpoint = self.endpoint, offset, "query rejected at every page size");
                        break PageStatus::Failed;
                    }
                    debug!(endpoint = self.endpoint, offset, limit, "query rejected, shrinking page");
                    continue;
                }
            };

            let fetched = page.len();
            rows.extend(page);

            if let Some(max) = max_rows {
                if rows.len() >= max {
                    rows.truncate(max);
                    break PageStatus::Complete;
                }
            }
            if fetched < limit {
                break PageStatus::Complete;
            }
            offset += limit;
        };

        PagedResult {
            rows,
            status,
            requests,
        }
    }
}

/// Append the paging window to a query
pub fn paged_query(query: &str, limit: usize, offset: usize) -> String {
    if offset > 0 {
        format!("{} LIMIT {} OFFSET {}", query, limit, offset)
    } else {
        format!("{} LIMIT {}", query, limit)
    }
}
